use std::fmt;

use sea_orm::DbBackend;

/// Named adapter feature that tests may need to switch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Savepoints,
    ForeignKeys,
    BulkAlter,
    AdvisoryLocks,
    OptimizerHints,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::Savepoints,
        Capability::ForeignKeys,
        Capability::BulkAlter,
        Capability::AdvisoryLocks,
        Capability::OptimizerHints,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Savepoints => "savepoints",
            Capability::ForeignKeys => "foreign_keys",
            Capability::BulkAlter => "bulk_alter",
            Capability::AdvisoryLocks => "advisory_locks",
            Capability::OptimizerHints => "optimizer_hints",
        })
    }
}

/// Feature flags fixed when an instrumented connection is built.
///
/// A connection never changes its capabilities after construction; build a
/// new connection to test against a different set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterCapabilities {
    pub savepoints: bool,
    pub foreign_keys: bool,
    pub bulk_alter: bool,
    pub advisory_locks: bool,
    pub optimizer_hints: bool,
}

impl AdapterCapabilities {
    /// What the backend itself supports.
    pub fn for_backend(backend: DbBackend) -> Self {
        match backend {
            DbBackend::Sqlite => Self {
                savepoints: true,
                foreign_keys: true,
                bulk_alter: false,
                advisory_locks: false,
                optimizer_hints: false,
            },
            DbBackend::Postgres => Self {
                savepoints: true,
                foreign_keys: true,
                bulk_alter: true,
                advisory_locks: true,
                optimizer_hints: false,
            },
            DbBackend::MySql => Self {
                savepoints: true,
                foreign_keys: true,
                bulk_alter: true,
                advisory_locks: true,
                optimizer_hints: true,
            },
        }
    }

    /// Everything off.
    pub fn none() -> Self {
        Self {
            savepoints: false,
            foreign_keys: false,
            bulk_alter: false,
            advisory_locks: false,
            optimizer_hints: false,
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Savepoints => self.savepoints,
            Capability::ForeignKeys => self.foreign_keys,
            Capability::BulkAlter => self.bulk_alter,
            Capability::AdvisoryLocks => self.advisory_locks,
            Capability::OptimizerHints => self.optimizer_hints,
        }
    }

    pub fn with(self, capability: Capability) -> Self {
        self.set(capability, true)
    }

    pub fn without(self, capability: Capability) -> Self {
        self.set(capability, false)
    }

    fn set(mut self, capability: Capability, on: bool) -> Self {
        let flag = match capability {
            Capability::Savepoints => &mut self.savepoints,
            Capability::ForeignKeys => &mut self.foreign_keys,
            Capability::BulkAlter => &mut self.bulk_alter,
            Capability::AdvisoryLocks => &mut self.advisory_locks,
            Capability::OptimizerHints => &mut self.optimizer_hints,
        };
        *flag = on;
        self
    }

    pub fn enabled(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }
}
