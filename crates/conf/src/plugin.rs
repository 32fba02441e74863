use anyhow::{bail, Context, Result};
use async_std::path::PathBuf;
use bevy::{
    prelude::*,
    tasks::{IoTaskPool, Task},
};
use futures_lite::future;
use pf_core::log_full_error;

use crate::{io::load_conf, Configuration};

pub(super) struct ConfPlugin {
    path: Option<PathBuf>,
}

impl ConfPlugin {
    pub(super) fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl Plugin for ConfPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ConfPath(self.path.clone()))
            .add_systems(Startup, start_loading)
            .add_systems(First, poll_conf.run_if(resource_exists::<LoadingTask>()));
    }
}

/// Explicitly chosen configuration file path.
#[derive(Resource)]
struct ConfPath(Option<PathBuf>);

#[derive(Resource)]
struct LoadingTask(Task<Result<Configuration>>);

fn start_loading(mut commands: Commands, path: Res<ConfPath>) {
    let path = path.0.clone();
    let task = IoTaskPool::get().spawn(async move {
        let path = match path {
            Some(path) => path,
            None => {
                let Some(base_conf_dir) = dirs::config_dir() else {
                    bail!("User's configuration directory cannot be established.")
                };
                PathBuf::from(base_conf_dir)
                    .join("Pathflock")
                    .join("conf.yaml")
            }
        };

        load_conf(path.as_path()).await.with_context(|| {
            format!(
                "Configuration loading from {} failed",
                path.to_string_lossy()
            )
        })
    });
    commands.insert_resource(LoadingTask(task));
}

fn poll_conf(mut commands: Commands, mut task: ResMut<LoadingTask>) {
    let Some(result) = future::block_on(future::poll_once(&mut task.0)) else {
        return;
    };
    commands.remove_resource::<LoadingTask>();

    match result {
        Ok(configuration) => {
            info!("Configuration loaded");
            commands.insert_resource(configuration);
        }
        Err(err) => {
            let error: &dyn std::error::Error = err.as_ref();
            log_full_error!(error);
            warn!("Falling back to default configuration");
            commands.init_resource::<Configuration>();
        }
    }
}
