//! Concurrent page loads that keep partial data.
//!
//! Each panel of a page is fetched independently and settles to its own
//! `Result`. A failing panel never cancels its siblings. Auth failures are
//! the exception the whole page cares about: any one of them sends the user
//! back to login.

use std::future::Future;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiError, ErrorKind};
use crate::models::{HistoryStatistics, Profile, Reservation, Vehicle, Wallet};

/// Await every future and collect all outcomes, successes and failures alike
pub async fn settle_all<I, F, T>(futures: I) -> Vec<Result<T, ApiError>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, ApiError>>,
{
    join_all(futures).await
}

/// Whether any outcome means the session is gone
pub fn requires_login<T>(results: &[Result<T, ApiError>]) -> bool {
    results
        .iter()
        .any(|r| r.as_ref().err().is_some_and(ApiError::is_auth_failure))
}

/// Escalate a batch of outcomes to recovery.
///
/// The token gate already navigates on `Unauthenticated`, so only a server
/// 401 with no gate failure alongside it needs an explicit redirect.
fn escalate<'a>(client: &ApiClient, errors: impl IntoIterator<Item = &'a ApiError>) -> bool {
    let (mut unauthorized, mut unauthenticated) = (false, false);
    for error in errors {
        match error.kind() {
            ErrorKind::Unauthorized => unauthorized = true,
            ErrorKind::Unauthenticated => unauthenticated = true,
            _ => {}
        }
    }
    if unauthorized && !unauthenticated {
        client.redirect_to_login();
    }
    unauthorized || unauthenticated
}

/// Everything the dashboard shows, panel by panel
#[derive(Debug)]
pub struct DashboardLoad {
    pub wallet: Result<Wallet, ApiError>,
    /// Active reservations only: paid and not yet ended
    pub reservations: Result<Vec<Reservation>, ApiError>,
    pub vehicles: Result<Vec<Vehicle>, ApiError>,
    pub profile: Result<Profile, ApiError>,
    pub statistics: Result<HistoryStatistics, ApiError>,
    /// The session is gone and the user was sent to login
    pub login_required: bool,
}

impl DashboardLoad {
    fn logged_out() -> Self {
        let gone = || ApiError::Unauthenticated("Invalid or expired authentication token".to_string());
        Self {
            wallet: Err(gone()),
            reservations: Err(gone()),
            vehicles: Err(gone()),
            profile: Err(gone()),
            statistics: Err(gone()),
            login_required: true,
        }
    }

    /// Errors of the panels that failed
    pub fn errors(&self) -> Vec<&ApiError> {
        [
            self.wallet.as_ref().err(),
            self.reservations.as_ref().err(),
            self.vehicles.as_ref().err(),
            self.profile.as_ref().err(),
            self.statistics.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Load the dashboard panels concurrently.
///
/// Without a usable token nothing is sent and the user is redirected once.
pub async fn load_dashboard(client: &ApiClient, now: DateTime<Utc>) -> DashboardLoad {
    if !client.tokens().is_valid() {
        info!("No valid session, skipping dashboard load");
        client.redirect_to_login();
        return DashboardLoad::logged_out();
    }

    let (wallet, reservations, vehicles, profile, statistics) = tokio::join!(
        client.wallet(),
        client.reservations(),
        client.vehicles(),
        client.profile(),
        client.history_statistics(),
    );

    let reservations = reservations.map(|all| {
        all.into_iter()
            .filter(|r| r.is_active(now))
            .collect::<Vec<_>>()
    });

    let mut load = DashboardLoad {
        wallet,
        reservations,
        vehicles,
        profile,
        statistics,
        login_required: false,
    };
    load.login_required = escalate(client, load.errors());
    debug!(
        failed = load.errors().len(),
        login_required = load.login_required,
        "Dashboard loaded"
    );
    load
}
