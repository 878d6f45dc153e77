// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod pagination;
pub mod walker;

pub use pagination::{discover, parse_total_results, plan_for_result_count};
pub use walker::{ArchiveWalker, DateWindow};
