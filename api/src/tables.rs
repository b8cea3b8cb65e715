//! Catalog of store tables exposed by the raw table browser. Each entry
//! pins the column selection, ordering, and row cap used when fetching.

pub const DEFAULT_TABLE_LIMIT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

const fn asc(column: &'static str) -> OrderBy {
    OrderBy { column, ascending: true }
}

#[derive(Debug, Clone, Copy)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub limit: u32,
    pub order_by: &'static [OrderBy],
    pub columns: &'static [&'static str],
}

pub const DATABASE_TABLES: &[TableDescriptor] = &[
    TableDescriptor {
        name: "team",
        label: "Teams",
        description: "Core team records with locations.",
        limit: DEFAULT_TABLE_LIMIT,
        order_by: &[asc("name")],
        columns: &["id", "name", "location"],
    },
    TableDescriptor {
        name: "person",
        label: "People",
        description: "Players and staff registered in the league.",
        limit: DEFAULT_TABLE_LIMIT,
        order_by: &[asc("last_name"), asc("first_name")],
        columns: &["id", "first_name", "last_name", "email", "phone_mobile", "birthday"],
    },
    TableDescriptor {
        name: "team_membership",
        label: "Team Memberships",
        description: "Mapping between people and their teams.",
        limit: DEFAULT_TABLE_LIMIT,
        order_by: &[asc("team_id"), asc("person_id")],
        columns: &["id", "team_id", "person_id", "role"],
    },
    TableDescriptor {
        name: "match",
        label: "Matches",
        description: "Scheduled matches between teams.",
        limit: DEFAULT_TABLE_LIMIT,
        order_by: &[asc("match_date"), asc("match_time")],
        columns: &[
            "id",
            "match_date",
            "match_time",
            "home_team_id",
            "away_team_id",
            "winner_team_id",
            "location",
        ],
    },
    TableDescriptor {
        name: "match_line",
        label: "Match Lines",
        description: "Line matchups recorded for each match.",
        limit: DEFAULT_TABLE_LIMIT,
        order_by: &[asc("match_id"), asc("line_number")],
        columns: &[
            "id",
            "match_id",
            "line_number",
            "home_player1",
            "home_player2",
            "away_player1",
            "away_player2",
            "winner_team_id",
        ],
    },
    TableDescriptor {
        name: "line_game",
        label: "Line Games",
        description: "Individual game scores per line.",
        limit: DEFAULT_TABLE_LIMIT,
        order_by: &[asc("line_id"), asc("game_number")],
        columns: &["id", "line_id", "game_number", "home_score", "away_score"],
    },
    TableDescriptor {
        name: "team_standings",
        label: "Team Standings View",
        description: "View summarizing team records & points.",
        limit: 100,
        order_by: &[OrderBy { column: "total_points", ascending: false }],
        columns: &[
            "team_id",
            "team_name",
            "matches_played",
            "matches_won",
            "matches_lost",
            "lines_won",
            "lines_lost",
            "games_won",
            "games_lost",
            "total_points",
            "win_percentage",
        ],
    },
];

pub fn descriptor_for(name: &str) -> Option<&'static TableDescriptor> {
    DATABASE_TABLES.iter().find(|entry| entry.name == name)
}
