// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 归档模块
///
/// 实现分页归档页面的发现与遍历
pub mod archive;

/// 配置模块
///
/// 处理引擎的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务模型（抓取任务、抓取结果、记录）
pub mod domain;

/// 引擎模块
///
/// 实现分层的网页抓取引擎链
pub mod engines;

/// 调度模块
///
/// 实现并发准入、冷却闸门和长周期节奏控制
pub mod governor;

/// 提取模块
///
/// 实现按站点分发的字段提取规则
pub mod extract;

/// 门面模块
///
/// 对外暴露的库入口，组合调度、引擎和提取
pub mod harvester;

/// PDF模块
///
/// 实现多策略PDF获取与章节切分
pub mod pdf;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
