//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT
//!
//! File format handlers

pub mod glb;

pub use glb::{GlbContainer, GltfDocument, PayloadBuffer, parse_glb_bytes, read_glb, write_glb, write_glb_bytes};
