//! Simulation parameters.
//!
//! [`SimulationParams`] is the request shape sent by the dashboard: six
//! integer fields, any of which may be missing. [`SimulationConfig`] is the
//! validated, immutable form a run is started with. The only way to get a
//! `SimulationConfig` is through `TryFrom<SimulationParams>`, so a running
//! simulation never sees an invalid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on vendors and customers per run.
///
/// Each worker becomes its own task in the runtime, so the fan-out is capped.
pub const MAX_WORKERS: u64 = 1024;

/// Errors produced while validating [`SimulationParams`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A field was absent or null.
    #[error("all fields are required: {0} is missing")]
    Missing(&'static str),

    /// A field was zero or negative.
    #[error("{field} must be a positive number, got {value}")]
    NotPositive {
        /// Wire name of the offending field
        field: &'static str,
        /// Value received
        value: i64,
    },

    /// Supply larger than the pool can ever hold.
    #[error("total tickets ({total}) cannot exceed max ticket capacity ({capacity})")]
    SupplyExceedsCapacity {
        /// Requested total tickets
        total: u64,
        /// Requested pool capacity
        capacity: u64,
    },

    /// Worker count above [`MAX_WORKERS`].
    #[error("{field} exceeds limit of {limit}, got {value}")]
    TooLarge {
        /// Wire name of the offending field
        field: &'static str,
        /// Value received
        value: u64,
        /// Maximum accepted value
        limit: u64,
    },
}

/// Raw simulation parameters as received from a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    /// Maximum tickets the pool may hold at once
    pub max_ticket_capacity: Option<i64>,
    /// Tickets the run will ever release
    pub total_tickets: Option<i64>,
    /// Tickets each vendor attempts to release per tick
    pub ticket_release_rate: Option<i64>,
    /// Tickets each customer attempts to retrieve per tick
    pub customer_retrieval_rate: Option<i64>,
    /// Number of vendor workers
    pub vendors: Option<i64>,
    /// Number of customer workers
    pub customers: Option<i64>,
}

impl SimulationParams {
    /// Parameters with every field present.
    pub fn new(
        max_ticket_capacity: i64,
        total_tickets: i64,
        ticket_release_rate: i64,
        customer_retrieval_rate: i64,
        vendors: i64,
        customers: i64,
    ) -> Self {
        Self {
            max_ticket_capacity: Some(max_ticket_capacity),
            total_tickets: Some(total_tickets),
            ticket_release_rate: Some(ticket_release_rate),
            customer_retrieval_rate: Some(customer_retrieval_rate),
            vendors: Some(vendors),
            customers: Some(customers),
        }
    }

    fn fields(&self) -> [(&'static str, Option<i64>); 6] {
        [
            ("maxTicketCapacity", self.max_ticket_capacity),
            ("totalTickets", self.total_tickets),
            ("ticketReleaseRate", self.ticket_release_rate),
            ("customerRetrievalRate", self.customer_retrieval_rate),
            ("vendors", self.vendors),
            ("customers", self.customers),
        ]
    }
}

/// Validated simulation configuration.
///
/// # Invariants
///
/// - Every field is strictly positive
/// - `total_tickets <= max_ticket_capacity`
/// - `vendors <= MAX_WORKERS` and `customers <= MAX_WORKERS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    max_ticket_capacity: u64,
    total_tickets: u64,
    ticket_release_rate: u64,
    customer_retrieval_rate: u64,
    vendors: usize,
    customers: usize,
}

impl SimulationConfig {
    /// Maximum tickets the pool may hold at once.
    pub fn max_ticket_capacity(&self) -> u64 {
        self.max_ticket_capacity
    }

    /// Tickets the run will ever release.
    pub fn total_tickets(&self) -> u64 {
        self.total_tickets
    }

    /// Batch size of one vendor tick.
    pub fn ticket_release_rate(&self) -> u64 {
        self.ticket_release_rate
    }

    /// Batch size of one customer tick.
    pub fn customer_retrieval_rate(&self) -> u64 {
        self.customer_retrieval_rate
    }

    /// Number of vendor workers.
    pub fn vendors(&self) -> usize {
        self.vendors
    }

    /// Number of customer workers.
    pub fn customers(&self) -> usize {
        self.customers
    }
}

impl TryFrom<SimulationParams> for SimulationConfig {
    type Error = ConfigError;

    fn try_from(params: SimulationParams) -> Result<Self, Self::Error> {
        let fields = params.fields();

        // Report a missing field before judging any value, matching the
        // dashboard's "all fields are required" check.
        let mut values = [0u64; 6];
        for (field, value) in fields {
            if value.is_none() {
                return Err(ConfigError::Missing(field));
            }
        }
        for (slot, (field, value)) in values.iter_mut().zip(fields) {
            let value = value.unwrap_or_default();
            *slot = u64::try_from(value)
                .ok()
                .filter(|v| *v > 0)
                .ok_or(ConfigError::NotPositive { field, value })?;
        }

        let [capacity, total, release_rate, retrieval_rate, vendors, customers] = values;

        if total > capacity {
            return Err(ConfigError::SupplyExceedsCapacity { total, capacity });
        }

        for (field, count) in [("vendors", vendors), ("customers", customers)] {
            if count > MAX_WORKERS {
                return Err(ConfigError::TooLarge { field, value: count, limit: MAX_WORKERS });
            }
        }

        Ok(Self {
            max_ticket_capacity: capacity,
            total_tickets: total,
            ticket_release_rate: release_rate,
            customer_retrieval_rate: retrieval_rate,
            vendors: vendors as usize,
            customers: customers as usize,
        })
    }
}
