// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

pub mod catalog;
pub mod describe;
pub mod init;
pub mod list;
