//! Recent activity for the admin dashboard.

use std::sync::Arc;

use super::store::{AmbulanceRequestStore, HelpRequestStore};
use crate::error::LifecycleError;
use crate::models::activity::{
    merge_activity, ActivityItem, ACTIVITY_FEED_LIMIT, ACTIVITY_HELP_STATUSES,
};
use crate::models::RequestFilter;

#[derive(Clone)]
pub struct ActivityService {
    help_requests: Arc<dyn HelpRequestStore>,
    ambulance_requests: Arc<dyn AmbulanceRequestStore>,
}

impl ActivityService {
    pub fn new(
        help_requests: Arc<dyn HelpRequestStore>,
        ambulance_requests: Arc<dyn AmbulanceRequestStore>,
    ) -> Self {
        Self {
            help_requests,
            ambulance_requests,
        }
    }

    /// Latest ambulance requests and in-progress or resolved help requests,
    /// newest first.
    pub async fn recent(&self, hospital_id: &str) -> Result<Vec<ActivityItem>, LifecycleError> {
        let limit = ACTIVITY_FEED_LIMIT as i64;

        let help = self
            .help_requests
            .list_for_hospital(
                hospital_id,
                &RequestFilter::with_statuses(ACTIVITY_HELP_STATUSES.to_vec(), limit, 0),
            )
            .await?;
        let ambulance = self
            .ambulance_requests
            .list_for_hospital(hospital_id, &RequestFilter::all(limit, 0))
            .await?;

        Ok(merge_activity(&help, &ambulance, ACTIVITY_FEED_LIMIT))
    }
}

impl std::fmt::Debug for ActivityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityService").finish_non_exhaustive()
    }
}
