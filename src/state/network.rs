use crate::state::messages::{AutofillSetup, NetworkRequest, NetworkResponse, RequestKind};
use league_api::client::{ApiError, LeagueDb, SaveMatchArgs};
use league_api::history::normalize_match_history;
use league_api::tables::descriptor_for;
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;

const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
pub const ERROR_CHAR: char = '!';

#[derive(Debug, Copy, Clone)]
pub struct LoadingState {
    pub is_loading: bool,
    pub spinner_char: char,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self { is_loading: false, spinner_char: ' ' }
    }
}

pub struct NetworkWorker {
    db: LeagueDb,
    requests: mpsc::Receiver<NetworkRequest>,
    responses: mpsc::Sender<NetworkResponse>,
    is_loading: Arc<AtomicBool>,
}

impl NetworkWorker {
    pub fn new(
        requests: mpsc::Receiver<NetworkRequest>,
        responses: mpsc::Sender<NetworkResponse>,
    ) -> Self {
        Self {
            db: LeagueDb::from_env(),
            requests,
            responses,
            is_loading: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.requests.recv().await {
            self.start_loading_animation().await;

            let source = request_kind(&request);
            let result = match request {
                NetworkRequest::LoadTeams => self.handle_load_teams().await,
                NetworkRequest::LoadStandings => self.handle_load_standings().await,
                NetworkRequest::LoadRoster { team_id, generation } => {
                    self.handle_load_roster(team_id, generation).await
                }
                NetworkRequest::LoadMatchHistory { team_id, generation } => {
                    self.handle_load_history(team_id, generation).await
                }
                NetworkRequest::LoadTableRows { table } => {
                    self.handle_load_table_rows(table).await
                }
                NetworkRequest::LoadAutofill => self.handle_autofill().await,
                NetworkRequest::SaveMatch { args } => self.handle_save_match(args).await,
            };

            debug!("network request complete");
            self.stop_loading_animation(result.is_ok()).await;

            let response = result.unwrap_or_else(|err| NetworkResponse::Error {
                source,
                message: err.to_string(),
            });

            if let Err(e) = self.responses.send(response).await {
                error!("Failed to send network response: {e}");
                break;
            }
        }
    }

    async fn handle_load_teams(&self) -> Result<NetworkResponse, ApiError> {
        debug!("loading teams");
        let teams = self.db.fetch_teams().await?;
        Ok(NetworkResponse::TeamsLoaded { teams })
    }

    async fn handle_load_standings(&self) -> Result<NetworkResponse, ApiError> {
        debug!("loading standings");
        let standings = self.db.fetch_standings().await?;
        Ok(NetworkResponse::StandingsLoaded { standings })
    }

    async fn handle_load_roster(
        &self,
        team_id: String,
        generation: u64,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("loading roster for team {team_id} (gen {generation})");
        let players = self.db.fetch_roster(&team_id).await?;
        Ok(NetworkResponse::RosterLoaded { team_id, players, generation })
    }

    async fn handle_load_history(
        &self,
        team_id: String,
        generation: u64,
    ) -> Result<NetworkResponse, ApiError> {
        debug!("loading match history for team {team_id} (gen {generation})");
        let rows = self.db.fetch_match_history(&team_id).await?;
        let entries = normalize_match_history(rows, &team_id);
        Ok(NetworkResponse::MatchHistoryLoaded { team_id, entries, generation })
    }

    async fn handle_load_table_rows(
        &self,
        table: &'static str,
    ) -> Result<NetworkResponse, ApiError> {
        let descriptor = descriptor_for(table)
            .ok_or_else(|| ApiError::NotFound(format!("unknown table {table}")))?;
        debug!("loading raw rows for table {table}");
        let rows = self.db.fetch_table_rows(descriptor).await?;
        Ok(NetworkResponse::TableRowsLoaded { table, rows })
    }

    /// Pick two teams that each have at least two rostered players and hand
    /// their rosters to the entry form. The starting team rotates with the
    /// clock so repeated autofills do not always produce the same fixture.
    async fn handle_autofill(&self) -> Result<NetworkResponse, ApiError> {
        let teams = self.db.fetch_teams().await?;
        if teams.len() < 2 {
            return Err(ApiError::Other(
                "autofill needs at least two teams in the league".into(),
            ));
        }

        let offset = chrono::Local::now().timestamp_millis().unsigned_abs() as usize % teams.len();
        let mut picked = Vec::with_capacity(2);
        for step in 0..teams.len() {
            let team = &teams[(offset + step) % teams.len()];
            let roster = self.db.fetch_roster(&team.id).await?;
            if roster.len() >= 2 {
                picked.push((team.clone(), roster));
                if picked.len() == 2 {
                    break;
                }
            }
        }

        let Some((away_team, away_roster)) = picked.pop() else {
            return Err(ApiError::Other(
                "autofill needs two teams with at least two players each".into(),
            ));
        };
        let Some((home_team, home_roster)) = picked.pop() else {
            return Err(ApiError::Other(
                "autofill needs two teams with at least two players each".into(),
            ));
        };

        Ok(NetworkResponse::AutofillReady {
            setup: AutofillSetup { home_team, away_team, home_roster, away_roster },
        })
    }

    async fn handle_save_match(&self, args: SaveMatchArgs) -> Result<NetworkResponse, ApiError> {
        debug!(
            "saving match {} vs {} with {} lines",
            args.home_team_id,
            args.away_team_id,
            args.lines.len()
        );
        let match_id = self.db.save_match(args).await?;
        Ok(NetworkResponse::MatchSaved { match_id })
    }

    async fn start_loading_animation(&self) {
        self.is_loading.store(true, Ordering::Relaxed);

        let mut loading_state =
            LoadingState { is_loading: true, spinner_char: SPINNER_CHARS[0] };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged { loading_state })
            .await;

        let responses = self.responses.clone();
        let is_loading = self.is_loading.clone();

        tokio::spawn(async move {
            let mut spinner_index = 1;
            let mut interval = tokio::time::interval(Duration::from_millis(33));
            loop {
                interval.tick().await;
                if !is_loading.load(Ordering::Relaxed) {
                    break;
                }
                loading_state.spinner_char = SPINNER_CHARS[spinner_index];
                spinner_index = (spinner_index + 1) % SPINNER_CHARS.len();
                let _ = responses
                    .send(NetworkResponse::LoadingStateChanged { loading_state })
                    .await;
            }
        });
    }

    async fn stop_loading_animation(&self, is_ok: bool) {
        self.is_loading.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(15)).await;

        let spinner_char = if is_ok { ' ' } else { ERROR_CHAR };
        let _ = self
            .responses
            .send(NetworkResponse::LoadingStateChanged {
                loading_state: LoadingState { is_loading: false, spinner_char },
            })
            .await;
    }
}

fn request_kind(request: &NetworkRequest) -> RequestKind {
    match request {
        NetworkRequest::LoadTeams => RequestKind::Teams,
        NetworkRequest::LoadStandings => RequestKind::Standings,
        NetworkRequest::LoadRoster { .. } => RequestKind::Roster,
        NetworkRequest::LoadMatchHistory { .. } => RequestKind::MatchHistory,
        NetworkRequest::LoadTableRows { .. } => RequestKind::TableRows,
        NetworkRequest::LoadAutofill => RequestKind::Autofill,
        NetworkRequest::SaveMatch { .. } => RequestKind::SaveMatch,
    }
}
