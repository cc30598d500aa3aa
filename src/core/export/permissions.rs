//! Project access assignment
//!
//! Every registered user is invited to a new project and then granted full
//! control. Per-user failures never fail the submission; they are returned as
//! outcomes instead.

use crate::adapters::bluebeam::DocumentService;
use crate::domain::ids::ProjectId;
use crate::domain::User;

/// What happened for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStatus {
    /// Invited and granted full control
    Granted,
    /// The invitation was rejected
    InviteFailed(String),
    /// Invited, but absent from the project's member list
    NotListed,
    /// Listing members or setting the permission failed
    GrantFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessOutcome {
    pub email: String,
    pub status: AccessStatus,
}

impl AccessOutcome {
    pub fn is_granted(&self) -> bool {
        self.status == AccessStatus::Granted
    }
}

/// Invite `users` to the project and grant each of them full control
///
/// Members are matched by e-mail, case-insensitively. Outcomes are returned
/// in the order of `users`.
pub async fn assign_full_access(
    service: &dyn DocumentService,
    token: &str,
    project_id: &ProjectId,
    users: &[User],
) -> Vec<AccessOutcome> {
    let mut outcomes = Vec::with_capacity(users.len());
    let mut invited = Vec::new();

    for user in users {
        match service.add_project_user(token, project_id, &user.email).await {
            Ok(()) => invited.push(outcomes.len()),
            Err(e) => {
                tracing::warn!(project_id = %project_id, email = %user.email, error = %e, "Failed to invite user");
                outcomes.push(AccessOutcome {
                    email: user.email.clone(),
                    status: AccessStatus::InviteFailed(e.to_string()),
                });
                continue;
            }
        }
        outcomes.push(AccessOutcome {
            email: user.email.clone(),
            status: AccessStatus::NotListed,
        });
    }

    if invited.is_empty() {
        return outcomes;
    }

    let members = match service.list_project_users(token, project_id).await {
        Ok(members) => members,
        Err(e) => {
            tracing::warn!(project_id = %project_id, error = %e, "Failed to list project users");
            for index in invited {
                outcomes[index].status = AccessStatus::GrantFailed(e.to_string());
            }
            return outcomes;
        }
    };

    for index in invited {
        let email = outcomes[index].email.clone();
        let Some(member) = members.iter().find(|m| m.email.eq_ignore_ascii_case(&email)) else {
            tracing::warn!(project_id = %project_id, email = %email, "Invited user not listed on project");
            continue;
        };

        outcomes[index].status = match service.set_full_access(token, project_id, member.id).await {
            Ok(()) => {
                tracing::debug!(project_id = %project_id, email = %email, "Granted full control");
                AccessStatus::Granted
            }
            Err(e) => {
                tracing::warn!(project_id = %project_id, email = %email, error = %e, "Failed to grant full control");
                AccessStatus::GrantFailed(e.to_string())
            }
        };
    }

    outcomes
}
