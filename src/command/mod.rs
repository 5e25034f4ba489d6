// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! External CLIs driven by the provisioner.

pub mod aws;
pub mod eksctl;
pub mod runner;

pub use aws::{Aws, IngressSource};
pub use eksctl::Eksctl;
pub use runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};
