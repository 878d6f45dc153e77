// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod archive_walk_test;
pub mod fetch_scenarios_test;
pub mod helpers;
