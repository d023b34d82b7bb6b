// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules for the message state tables.

pub mod channel_state;
pub mod messages;
pub mod worker_lease;
