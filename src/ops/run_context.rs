//! Inputs shared by `--cache` and `--sync_back`.
//!
//! Everything is read once at the start of a run and passed by reference;
//! nothing is cached behind the caller's back.

use std::path::PathBuf;

use anyhow::Result;

use crate::cache::Locations;
use crate::core::{ApollonConfig, BuildEnvironment, LockData, SourceMappings, APOLLONFILE};
use crate::sources::{IdentityResolver, RevisionProvider};

/// The immutable state of one build-phase invocation.
#[derive(Debug, Clone)]
pub struct RunContext {
    env: BuildEnvironment,
    locations: Locations,
    lock: LockData,
    config: ApollonConfig,
    mappings: SourceMappings,
}

impl RunContext {
    /// Read Podfile.lock and the Apollonfile for the build described by
    /// `env`.
    pub fn load(env: BuildEnvironment, cache_root: impl Into<PathBuf>) -> Result<Self> {
        let lock = LockData::load(&env.podfile_lock_path())?;
        let config = ApollonConfig::load(&Self::apollonfile_path(&env))?;
        Ok(Self::new(env, cache_root, lock, config))
    }

    pub fn new(
        env: BuildEnvironment,
        cache_root: impl Into<PathBuf>,
        lock: LockData,
        config: ApollonConfig,
    ) -> Self {
        let locations = Locations::new(cache_root, &env);
        let mappings = SourceMappings::in_project_dir(env.project_dir());
        RunContext {
            env,
            locations,
            lock,
            config,
            mappings,
        }
    }

    fn apollonfile_path(env: &BuildEnvironment) -> PathBuf {
        env.project_dir().join(APOLLONFILE)
    }

    pub fn env(&self) -> &BuildEnvironment {
        &self.env
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn lock(&self) -> &LockData {
        &self.lock
    }

    pub fn config(&self) -> &ApollonConfig {
        &self.config
    }

    pub fn mappings(&self) -> &SourceMappings {
        &self.mappings
    }

    /// Identity resolver over this run's lock data.
    pub fn identities<'a>(&'a self, revisions: &'a dyn RevisionProvider) -> IdentityResolver<'a> {
        IdentityResolver::new(&self.lock, self.env.podfile_dir(), revisions)
    }
}
