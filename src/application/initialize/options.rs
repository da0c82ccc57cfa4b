//! Initialization options

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::domain::value_objects::Environment;

/// Host ports tried when a preferred port is taken
pub const DEFAULT_PORT_RANGE: RangeInclusive<u16> = 20000..=29999;

/// Whether the framework project already exists in the target directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitMode {
    /// New project in an empty (or missing) directory
    #[default]
    Fresh,
    /// Add devstack to an existing framework project
    Existing,
}

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub stack: String,
    /// `category.service` ids in selection order
    pub services: Vec<String>,
    pub mode: InitMode,
    /// Replace an existing devstack setup
    pub force: bool,
    /// Environment whose overlay lifecycle commands use
    pub environment: Environment,
    /// Also generate the prod overlay when `environment` is dev
    pub include_prod: bool,
    /// Explicit project name; derived from the directory otherwise
    pub name: Option<String>,
    /// Values that win over everything the templates declare
    pub variables: BTreeMap<String, String>,
    pub port_range: RangeInclusive<u16>,
}

impl InitOptions {
    pub fn new(stack: impl Into<String>) -> Self {
        Self {
            stack: stack.into(),
            services: Vec::new(),
            mode: InitMode::Fresh,
            force: false,
            environment: Environment::Dev,
            include_prod: false,
            name: None,
            variables: BTreeMap::new(),
            port_range: DEFAULT_PORT_RANGE,
        }
    }

    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: InitMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_prod(mut self, include_prod: bool) -> Self {
        self.include_prod = include_prod;
        self
    }

    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: BTreeMap<String, String>) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn with_port_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.port_range = range;
        self
    }

    /// Environments to generate overlays for
    pub fn environments(&self) -> Vec<Environment> {
        if self.include_prod || self.environment == Environment::Prod {
            vec![Environment::Dev, Environment::Prod]
        } else {
            vec![Environment::Dev]
        }
    }
}
