// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod plan;
pub mod record;
pub mod task;

pub use plan::PaginationPlan;
pub use record::{FieldValue, ScrapeRecord};
pub use task::{FetchOutcome, FetchTask, Tier};
