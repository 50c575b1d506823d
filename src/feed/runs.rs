//! Grouping of activities into display groups.
//!
//! Adjacent pushes to the same repository collapse into a single
//! `Activity::Push` run. Every other activity stands alone and ends any
//! run in progress.

use crate::models::Activity;

/// Fold an ordered activity sequence into display groups.
///
/// Order is preserved. A push extends the last group only when that group
/// is a push run for the same repository name.
pub fn group_runs<I>(activities: I) -> Vec<Activity>
where
    I: IntoIterator<Item = Activity>,
{
    activities.into_iter().fold(Vec::new(), |mut groups, activity| {
        if let Activity::Push {
            repo,
            commits,
            pushes,
            anchor,
        } = &activity
        {
            if let Some(Activity::Push {
                repo: run_repo,
                commits: run_commits,
                pushes: run_pushes,
                anchor: run_anchor,
            }) = groups.last_mut()
            {
                if run_repo.name == repo.name {
                    *run_commits += commits;
                    *run_pushes += pushes;
                    // Events arrive newest first, so each later push is older.
                    *run_anchor = anchor.clone();
                    return groups;
                }
            }
        }
        groups.push(activity);
        groups
    })
}
