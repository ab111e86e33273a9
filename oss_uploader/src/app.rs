use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};
use oss_client::RemoteConnector;

use crate::constants::*;
use crate::errors::Result;
use crate::logging::{init_logging, LoggingConfig};
use crate::retry::RetryPolicy;
use crate::session::UploadSession;
use crate::settings::Settings;
use crate::upload_run::{run_uploads, RunOptions, RunSummary};

#[derive(Args, Debug)]
struct CliOverrides {
    /// Increase verbosity of output (-v, -vv, etc.)
    #[clap(long, short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Write logs to this file, or to a new file in this directory. Writes to stderr if not provided.
    #[clap(long, short)]
    pub log: Option<PathBuf>,
}

/// Upload every file in a working directory to an object storage bucket,
/// under a key prefixed by this device's id.
///
/// The device id is read from the "device" section of the device file; the
/// endpoint, bucket and access keys from the "upload" section of the config
/// file. Each failed upload is retried up to 5 times, one minute apart.
#[derive(Parser, Debug)]
#[clap(name = PROGRAM_NAME, version = CURRENT_VERSION, verbatim_doc_comment)]
pub struct UploaderApp {
    /// Device config file.
    #[clap(short = 'e', default_value = DEFAULT_DEVICE_FILE)]
    device_file: PathBuf,

    /// General config file.
    #[clap(short = 'c', default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,

    /// Upload working directory.
    #[clap(short = 'w', default_value = DEFAULT_WORK_DIR)]
    work_dir: PathBuf,

    /// Delete each local file after it is uploaded.
    #[clap(short = 'd')]
    delete: bool,

    #[clap(flatten)]
    overrides: CliOverrides,
}

impl UploaderApp {
    pub async fn run(self) -> Result<RunSummary> {
        init_logging(LoggingConfig::from_cli(
            self.overrides.log.as_deref(),
            self.overrides.verbose,
            CURRENT_VERSION,
        ));

        let settings = Settings::load(&self.device_file, &self.config_file)?;
        println!("{settings}");

        let options = RunOptions {
            work_dir: self.work_dir,
            delete_after_upload: self.delete,
            retry_policy: RetryPolicy::default(),
        };

        let mut session = UploadSession::new(RemoteConnector, settings.oss_target());
        Ok(run_uploads(&settings, &options, &mut session).await)
    }
}
