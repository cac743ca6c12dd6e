//! 折扣转盘命令行工具
//!
//! 在终端中转动转盘、查看已领取的折扣码，以及浏览后台资源。

pub mod cli;
