// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod cooldown;
pub mod pacer;
pub mod scheduler;

pub use cooldown::CooldownGate;
pub use pacer::LongHorizonPacer;
pub use scheduler::Governor;
