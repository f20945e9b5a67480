// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod meter;
pub mod prices;

pub use meter::CreditMeter;
pub use prices::{BillableOperation, PriceTable};
