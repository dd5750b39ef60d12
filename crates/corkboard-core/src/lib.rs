// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

pub mod clock;
pub mod ids;
pub mod membership;
pub mod mentions;
pub mod position;

pub const CRATE_NAME: &str = "corkboard-core";

pub use clock::now_ms;
pub use ids::{
    ActivityId, AttachmentId, CommentId, IdError, InvitationId, NotificationId, ProjectId, TaskId,
    UserId, WorkspaceId,
};
pub use membership::{authorize, authorize_kick, Denied, Role};
pub use mentions::extract_mention_candidates;
pub use position::{next_position, position_between};
