// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node-type catalogs built on the core framework.

pub mod compositor;
