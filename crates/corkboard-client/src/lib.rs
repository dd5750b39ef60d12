// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Board-side reconciliation.
//!
//! An explicit reducer over the task list of one board, decoupled from the
//! transport: drag interactions mutate the state speculatively for visual
//! feedback, inbound broadcast events merge by task id last-applied-wins,
//! and a snapshot refetch replaces everything. The snapshot path is the
//! correctness backstop — delivery has no replay, so a reconnecting client
//! must revalidate rather than trust its accumulated state.

mod board;

pub const CRATE_NAME: &str = "corkboard-client";

pub use board::{BoardState, DragTarget, MoveIntent};
