use crate::CLAP_STYLING;
use clap::{arg, command};
use sitewalk_core::DEFAULT_MAP_FILE;
use sitewalk_core::ai::ModelProfile;
use sitewalk_core::session::DEFAULT_DOCS_DIR;
use url::Url;

fn map_file_arg() -> clap::Arg {
    arg!(-m --"map-file" <PATH>)
        .required(false)
        .help("Exploration map file (created if missing)")
        .default_value(DEFAULT_MAP_FILE)
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitewalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitewalk")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("explore")
                .about(
                    "Interactively explore a web application from a start page. Each analyzed \
                page gets a test case document and is recorded in the exploration map.",
                )
                .arg(
                    arg!(<URL>)
                        .required(true)
                        .help("The http(s) URL to start exploring from")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(map_file_arg())
                .arg(
                    arg!(-d --"docs-dir" <PATH>)
                        .required(false)
                        .help("Directory for generated test case documents")
                        .default_value(DEFAULT_DOCS_DIR),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Page load timeout in seconds")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"filter-model" <PROFILE>)
                        .required(false)
                        .help("Model profile used to filter navigation links")
                        .value_parser(profile_names())
                        .default_value(ModelProfile::Haiku.as_str()),
                )
                .arg(
                    arg!(--"planner-model" <PROFILE>)
                        .required(false)
                        .help("Model profile used to write test case documents")
                        .value_parser(profile_names())
                        .default_value(ModelProfile::Sonnet.as_str()),
                )
                .arg(
                    arg!(-v --"verbose")
                        .required(false)
                        .help("Show debug logging (RUST_LOG overrides)")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("status")
                .about("Show what an exploration map contains and which links are still pending")
                .arg(map_file_arg()),
        )
        .subcommand(
            command!("models")
                .about("List model profiles and the models they use")
                .arg(
                    arg!(-c --"check")
                        .required(false)
                        .help("Send a minimal request to each model and report availability and latency")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}

fn profile_names() -> [&'static str; 3] {
    ModelProfile::ALL.map(|p| p.as_str())
}
