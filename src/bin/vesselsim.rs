use clap::{App, Arg, ArgMatches, SubCommand};
use colored::*;
use std::process::Command;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use vesselsim::cmdb::CmdbClient;
use vesselsim::report;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("vesselsim")
        .version("0.1.0")
        .author("Marine Systems Engineering Team")
        .about("⚓ Vessel Safety Systems Simulator - fire detection, ESD, and bilge alarm simulation")
        .arg(
            Arg::with_name("host")
                .short("h")
                .long("host")
                .value_name("HOST")
                .help("Simulator host address")
                .takes_value(true)
                .default_value(DEFAULT_HOST)
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Simulator port")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
                .global(true),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Output format")
                .takes_value(true)
                .possible_values(&["json", "table", "compact"])
                .default_value("table")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enable verbose output")
                .global(true),
        )
        .arg(
            Arg::with_name("at")
                .long("at")
                .value_name("TIMESTAMP")
                .help("Schedule command for future execution (Unix timestamp in milliseconds)")
                .takes_value(true)
                .global(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(_) => Ok(()),
                    Err(_) => Err("Timestamp must be a valid number".into()),
                }),
        )
        .subcommand(
            SubCommand::with_name("ping")
                .about("🏓 Test connection to the simulator")
                .long_about("Sends a ping command to verify the simulator is responsive"),
        )
        .subcommand(
            SubCommand::with_name("status")
                .about("📊 Get comprehensive system status")
                .long_about("Retrieves detailed status information from all safety subsystems"),
        )
        .subcommand(
            SubCommand::with_name("fire")
                .about("🔥 Fire detection system management")
                .subcommand(
                    SubCommand::with_name("temp")
                        .about("Set a detector temperature reading")
                        .arg(
                            Arg::with_name("detector")
                                .help("Detector index (0-9)")
                                .required(true)
                                .validator(|v| match v.parse::<u8>() {
                                    Ok(d) if d < 10 => Ok(()),
                                    _ => Err("Detector index must be 0-9".into()),
                                }),
                        )
                        .arg(
                            Arg::with_name("celsius")
                                .help("Temperature in °C (-40 to 150)")
                                .required(true)
                                .validator(|v| match v.parse::<f32>() {
                                    Ok(t) if (-40.0..=150.0).contains(&t) => Ok(()),
                                    _ => Err("Temperature must be between -40 and 150 °C".into()),
                                }),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("smoke")
                        .about("Set a detector smoke obscuration reading")
                        .arg(
                            Arg::with_name("detector")
                                .help("Detector index (0-9)")
                                .required(true)
                                .validator(|v| match v.parse::<u8>() {
                                    Ok(d) if d < 10 => Ok(()),
                                    _ => Err("Detector index must be 0-9".into()),
                                }),
                        )
                        .arg(
                            Arg::with_name("obscuration")
                                .help("Smoke obscuration (0.0-1.0)")
                                .required(true)
                                .validator(|v| match v.parse::<f32>() {
                                    Ok(s) if (0.0..=1.0).contains(&s) => Ok(()),
                                    _ => Err("Obscuration must be between 0.0 and 1.0".into()),
                                }),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("esd")
                .about("⛽ Emergency shutdown system management")
                .subcommand(
                    SubCommand::with_name("activate")
                        .about("Activate the emergency shutdown sequence")
                        .arg(
                            Arg::with_name("station")
                                .help("Initiating station")
                                .required(true)
                                .possible_values(&["bridge", "engine-room"]),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("reset")
                        .about("Reset the shutdown system and reopen the fuel valves"),
                ),
        )
        .subcommand(
            SubCommand::with_name("bilge")
                .about("🌊 Bilge alarm system management")
                .subcommand(
                    SubCommand::with_name("level")
                        .about("Set a compartment water level")
                        .arg(
                            Arg::with_name("compartment")
                                .help("Compartment index (0-4)")
                                .required(true)
                                .validator(|v| match v.parse::<u8>() {
                                    Ok(c) if c < 5 => Ok(()),
                                    _ => Err("Compartment index must be 0-4".into()),
                                }),
                        )
                        .arg(
                            Arg::with_name("millimeters")
                                .help("Water level in mm")
                                .required(true)
                                .validator(|v| match v.parse::<f32>() {
                                    Ok(l) if l >= 0.0 => Ok(()),
                                    _ => Err("Water level must be non-negative".into()),
                                }),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("alarm")
                .about("🚨 Central alarm panel management")
                .subcommand(
                    SubCommand::with_name("maintenance")
                        .about("Set maintenance mode for a subsystem")
                        .arg(
                            Arg::with_name("subsystem")
                                .help("Target subsystem")
                                .required(true)
                                .possible_values(&["fire", "esd", "bilge"]),
                        )
                        .arg(
                            Arg::with_name("state")
                                .help("Maintenance mode state")
                                .required(true)
                                .possible_values(&["on", "off", "enable", "disable"]),
                        )
                        .arg(
                            Arg::with_name("until")
                                .long("until")
                                .value_name("TIMESTAMP")
                                .help("Expire maintenance mode at this time (milliseconds)")
                                .takes_value(true),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("ack")
                        .about("Acknowledge all outstanding panel events"),
                ),
        )
        .subcommand(
            SubCommand::with_name("power")
                .about("🔌 Vessel power supply management")
                .subcommand(
                    SubCommand::with_name("cut")
                        .about("Cut the main supply (subsystems change over to emergency power)"),
                )
                .subcommand(SubCommand::with_name("restore").about("Restore the main supply")),
        )
        .subcommand(
            SubCommand::with_name("system")
                .about("🛠️  System management and diagnostics")
                .subcommand(
                    SubCommand::with_name("fault")
                        .about("Inject system fault for testing")
                        .arg(
                            Arg::with_name("subsystem")
                                .help("Target subsystem")
                                .required(true)
                                .possible_values(&["fire", "esd", "bilge"]),
                        )
                        .arg(
                            Arg::with_name("type")
                                .help("Fault type")
                                .required(true)
                                .possible_values(&["degraded", "failed", "offline"]),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("clear-faults")
                        .about("Clear system faults")
                        .arg(
                            Arg::with_name("subsystem")
                                .help("Target subsystem (optional - clears all if not specified)")
                                .required(false)
                                .possible_values(&["fire", "esd", "bilge"]),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("diagnostics")
                        .about("Run the automated self-test across all subsystems"),
                )
                .subcommand(
                    SubCommand::with_name("fault-injection")
                        .about("Control automated fault injection system")
                        .subcommand(
                            SubCommand::with_name("enable")
                                .about("Enable automated fault injection"),
                        )
                        .subcommand(
                            SubCommand::with_name("disable")
                                .about("Disable automated fault injection"),
                        )
                        .subcommand(
                            SubCommand::with_name("status")
                                .about("Show fault injection statistics and configuration"),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("monitor")
                .about("📈 Monitor live status stream")
                .long_about("Continuously monitor real-time status data from the simulator")
                .arg(
                    Arg::with_name("duration")
                        .short("d")
                        .long("duration")
                        .value_name("SECONDS")
                        .help("Monitor duration in seconds (default: infinite)")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("report")
                .about("📋 Generate a compliance report from test results")
                .arg(
                    Arg::with_name("input")
                        .short("i")
                        .long("input")
                        .value_name("PATH")
                        .help("Test results file (.json/.csv) or directory of JSON files")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .value_name("PATH")
                        .help("Output Markdown report path")
                        .takes_value(true)
                        .default_value("compliance_report.md"),
                ),
        )
        .subcommand(
            SubCommand::with_name("cmdb")
                .about("🗂️  Jira-backed configuration database access")
                .subcommand(
                    SubCommand::with_name("list")
                        .about("List configuration items")
                        .arg(
                            Arg::with_name("jql")
                                .long("jql")
                                .value_name("CLAUSE")
                                .help("Additional JQL filter clause")
                                .takes_value(true),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("create")
                        .about("Create a configuration item")
                        .arg(
                            Arg::with_name("summary")
                                .help("Item summary")
                                .required(true),
                        )
                        .arg(
                            Arg::with_name("description")
                                .help("Item description")
                                .required(false)
                                .default_value(""),
                        ),
                ),
        )
        .subcommand(
            SubCommand::with_name("server")
                .about("🚢 Start the simulator server")
                .long_about("Launches the vessel safety systems simulator server")
                .arg(
                    Arg::with_name("background")
                        .short("b")
                        .long("background")
                        .help("Run server in background"),
                ),
        )
        .get_matches();

    let host = matches.value_of("host").unwrap();
    let port = matches.value_of("port").unwrap().parse::<u16>()?;
    let format = matches.value_of("format").unwrap();
    let verbose = matches.is_present("verbose");
    let execution_time = matches.value_of("at").map(|t| t.parse::<u64>().unwrap());

    if verbose {
        println!("{}", "⚓ VesselSim - Vessel Safety Systems Simulator".bright_blue().bold());
        println!("{} {}:{}", "Connecting to".dimmed(), host, port);
    }

    match matches.subcommand() {
        ("ping", _) => {
            handle_ping(host, port, format, verbose, execution_time).await?;
        }
        ("status", _) => {
            handle_status(host, port, format, verbose).await?;
        }
        ("fire", Some(sub_matches)) => {
            handle_fire_command(sub_matches, host, port, format).await?;
        }
        ("esd", Some(sub_matches)) => {
            handle_esd_command(sub_matches, host, port, format, execution_time).await?;
        }
        ("bilge", Some(sub_matches)) => {
            handle_bilge_command(sub_matches, host, port, format).await?;
        }
        ("alarm", Some(sub_matches)) => {
            handle_alarm_command(sub_matches, host, port, format).await?;
        }
        ("power", Some(sub_matches)) => {
            handle_power_command(sub_matches, host, port, format).await?;
        }
        ("system", Some(sub_matches)) => {
            handle_system_command(sub_matches, host, port, format).await?;
        }
        ("monitor", Some(sub_matches)) => {
            handle_monitor(sub_matches, host, port, format).await?;
        }
        ("report", Some(sub_matches)) => {
            handle_report(sub_matches)?;
        }
        ("cmdb", Some(sub_matches)) => {
            handle_cmdb_command(sub_matches).await?;
        }
        ("server", Some(sub_matches)) => {
            handle_server(sub_matches, port).await?;
        }
        _ => {
            println!("{}", "No command specified. Use --help for usage information.".yellow());
            println!("{}", "Quick start:".bright_green());
            println!("  {} Start the simulator server", "vesselsim server".bright_cyan());
            println!("  {} Test connection", "vesselsim ping".bright_cyan());
            println!("  {} Monitor status", "vesselsim monitor".bright_cyan());
        }
    }

    Ok(())
}

async fn handle_ping(
    host: &str,
    port: u16,
    format: &str,
    verbose: bool,
    execution_time: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("{}", "Sending ping...".dimmed());
    }

    let response = send_command(host, port, create_ping_command(execution_time)).await?;

    match format {
        "json" => println!("{}", response),
        "compact" => println!("{}", "PONG".bright_green()),
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&response) {
                if parsed["status"] == "Success" {
                    println!("{} {}", "✅".green(), "Simulator is responsive".bright_green());
                } else {
                    println!("{} {}", "❌".red(), "Ping failed".bright_red());
                }
            } else {
                println!("{}", "PONG".bright_green());
            }
        }
    }

    Ok(())
}

async fn handle_status(
    host: &str,
    port: u16,
    format: &str,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if verbose {
        println!("{}", "Retrieving system status...".dimmed());
    }

    let response = send_command(host, port, create_status_command()).await?;

    match format {
        "json" => println!("{}", response),
        "compact" => println!("{}", "System operational".bright_green()),
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&response) {
                if parsed["status"] == "Success" {
                    println!("{} {}", "📊".bright_blue(), "System Status".bright_blue().bold());
                    println!("{} {}", "Status:".bright_white(), "Operational".bright_green());
                    println!(
                        "{} {}",
                        "Hint:".bright_white(),
                        "Use 'vesselsim monitor' for live subsystem detail".dimmed()
                    );
                } else {
                    println!("{} {}", "❌".red(), "Status check failed".bright_red());
                }
            }
        }
    }

    Ok(())
}

async fn handle_fire_command(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("temp", Some(sub_matches)) => {
            let detector: u8 = sub_matches.value_of("detector").unwrap().parse()?;
            let temp_c: f32 = sub_matches.value_of("celsius").unwrap().parse()?;
            let response =
                send_command(host, port, create_detector_temp_command(detector, temp_c)).await?;
            print_command_result(
                "Detector temperature",
                &format!("detector {} -> {}°C", detector, temp_c),
                &response,
                format,
            );
        }
        ("smoke", Some(sub_matches)) => {
            let detector: u8 = sub_matches.value_of("detector").unwrap().parse()?;
            let obscuration: f32 = sub_matches.value_of("obscuration").unwrap().parse()?;
            let response =
                send_command(host, port, create_detector_smoke_command(detector, obscuration))
                    .await?;
            print_command_result(
                "Detector smoke",
                &format!("detector {} -> {}", detector, obscuration),
                &response,
                format,
            );
        }
        _ => {
            println!("{}", "Fire subcommand required. Use 'vesselsim fire --help' for options.".yellow());
        }
    }
    Ok(())
}

async fn handle_esd_command(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
    execution_time: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("activate", Some(sub_matches)) => {
            let station = sub_matches.value_of("station").unwrap();
            let response = send_command(
                host,
                port,
                create_activate_shutdown_command(station, execution_time),
            )
            .await?;
            print_command_result("Emergency Shutdown", &format!("from {}", station), &response, format);
        }
        ("reset", _) => {
            let response = send_command(host, port, create_reset_shutdown_command()).await?;
            print_command_result("Shutdown Reset", "valves reopening", &response, format);
        }
        _ => {
            println!("{}", "ESD subcommand required. Use 'vesselsim esd --help' for options.".yellow());
        }
    }
    Ok(())
}

async fn handle_bilge_command(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("level", Some(sub_matches)) => {
            let compartment: u8 = sub_matches.value_of("compartment").unwrap().parse()?;
            let level_mm: f32 = sub_matches.value_of("millimeters").unwrap().parse()?;
            let response =
                send_command(host, port, create_water_level_command(compartment, level_mm)).await?;
            print_command_result(
                "Water level",
                &format!("compartment {} -> {} mm", compartment, level_mm),
                &response,
                format,
            );
        }
        _ => {
            println!("{}", "Bilge subcommand required. Use 'vesselsim bilge --help' for options.".yellow());
        }
    }
    Ok(())
}

async fn handle_alarm_command(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("maintenance", Some(sub_matches)) => {
            let subsystem = sub_matches.value_of("subsystem").unwrap();
            let state = normalize_state(sub_matches.value_of("state").unwrap());
            let expires_at = sub_matches
                .value_of("until")
                .map(|t| t.parse::<u64>())
                .transpose()?;
            let response = send_command(
                host,
                port,
                create_maintenance_command(subsystem, state, expires_at),
            )
            .await?;
            print_command_result(
                "Maintenance Mode",
                &format!("{} {}", subsystem, if state { "ON" } else { "OFF" }),
                &response,
                format,
            );
        }
        ("ack", _) => {
            let response = send_command(host, port, create_acknowledge_command()).await?;
            print_command_result("Alarm Acknowledge", "all events", &response, format);
        }
        _ => {
            println!("{}", "Alarm subcommand required. Use 'vesselsim alarm --help' for options.".yellow());
        }
    }
    Ok(())
}

async fn handle_power_command(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("cut", _) => {
            let response = send_command(host, port, create_cut_power_command()).await?;
            print_command_result("Main Power", "CUT", &response, format);
        }
        ("restore", _) => {
            let response = send_command(host, port, create_restore_power_command()).await?;
            print_command_result("Main Power", "RESTORED", &response, format);
        }
        _ => {
            println!("{}", "Power subcommand required. Use 'vesselsim power --help' for options.".yellow());
        }
    }
    Ok(())
}

async fn handle_fault_injection_command(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("enable", _) => {
            let response =
                send_command(host, port, create_fault_injection_enable_command(true)).await?;
            print_command_result("Fault Injection", "ENABLED", &response, format);
        }
        ("disable", _) => {
            let response =
                send_command(host, port, create_fault_injection_enable_command(false)).await?;
            print_command_result("Fault Injection", "DISABLED", &response, format);
        }
        ("status", _) => {
            let response = send_command(host, port, create_fault_injection_status_command()).await?;
            print_fault_injection_status(&response, format);
        }
        _ => {
            println!(
                "{}",
                "Fault injection subcommand required. Use 'vesselsim system fault-injection --help' for options."
                    .yellow()
            );
        }
    }
    Ok(())
}

async fn handle_system_command(
    matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("fault", Some(sub_matches)) => {
            let system = sub_matches.value_of("subsystem").unwrap();
            let fault_type = sub_matches.value_of("type").unwrap();
            let response = send_command(host, port, create_fault_command(system, fault_type)).await?;
            print_command_result(
                "Fault Injection",
                &format!("{} {}", system, fault_type),
                &response,
                format,
            );
        }
        ("clear-faults", Some(sub_matches)) => {
            let system = sub_matches.value_of("subsystem");
            let response = send_command(host, port, create_clear_faults_command(system)).await?;
            let target = system.unwrap_or("all systems");
            print_command_result("Clear Faults", target, &response, format);
        }
        ("diagnostics", _) => {
            let response = send_command(host, port, create_diagnostics_command()).await?;
            print_diagnostics_result(&response, format);
        }
        ("fault-injection", Some(sub_matches)) => {
            handle_fault_injection_command(sub_matches, host, port, format).await?;
        }
        _ => {
            println!("{}", "System subcommand required. Use 'vesselsim system --help' for options.".yellow());
        }
    }
    Ok(())
}

async fn handle_monitor(
    _matches: &ArgMatches<'_>,
    host: &str,
    port: u16,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "📡 Monitoring vessel status (Press Ctrl+C to stop)...".bright_blue().bold());

    match format {
        "json" => monitor_status_json(host, port).await?,
        "compact" => monitor_status_compact(host, port).await?,
        _ => monitor_status_table(host, port).await?,
    }

    Ok(())
}

fn handle_report(matches: &ArgMatches<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let input = std::path::Path::new(matches.value_of("input").unwrap());
    let output = std::path::Path::new(matches.value_of("output").unwrap());

    println!("{}", "📋 Generating compliance report...".bright_blue().bold());

    let summary = report::generate_report(input, output)?;

    println!(
        "{} {} test cases, {} passed, {} failed",
        "✅".green(),
        summary.total,
        summary.passed.to_string().bright_green(),
        summary.failed.to_string().bright_red()
    );
    if summary.failed == 0 {
        println!("{} {}", "✅".green(), "All requirements compliant".bright_green());
    } else {
        println!(
            "{} Non-compliant requirements: {}",
            "❌".red(),
            summary.requirements_failed.join(", ").bright_red()
        );
    }
    println!("{} Report written to {}", "📄".bright_blue(), output.display());

    Ok(())
}

async fn handle_cmdb_command(matches: &ArgMatches<'_>) -> Result<(), Box<dyn std::error::Error>> {
    match matches.subcommand() {
        ("list", Some(sub_matches)) => {
            let client = CmdbClient::from_env()?;
            let items = client.query_items(sub_matches.value_of("jql")).await?;

            println!("{}", "🗂️  Configuration Items".bright_blue().bold());
            println!("{}", "═══════════════════════".bright_blue());
            if items.is_empty() {
                println!("{}", "No items found".dimmed());
            }
            for item in items {
                println!(
                    "{} {} ({})",
                    item.key.bright_cyan(),
                    item.summary.bright_white(),
                    item.status.dimmed()
                );
            }
        }
        ("create", Some(sub_matches)) => {
            let summary = sub_matches.value_of("summary").unwrap();
            let description = sub_matches.value_of("description").unwrap();

            let client = CmdbClient::from_env()?;
            let key = client.create_item(summary, description, None).await?;

            println!("{} Created {}", "✅".green(), key.bright_cyan());
        }
        _ => {
            println!("{}", "CMDB subcommand required. Use 'vesselsim cmdb --help' for options.".yellow());
        }
    }
    Ok(())
}

async fn handle_server(
    matches: &ArgMatches<'_>,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let background = matches.is_present("background");

    println!("{}", "🚢 Starting vessel safety systems simulator server...".bright_green().bold());

    let mut cmd = Command::new("cargo");
    cmd.args(&["run", "--bin", "vesselsim-server"]);

    if background {
        cmd.spawn()?;
        println!("{} Server started in background on port {}", "✅".green(), port);
    } else {
        println!("{} Server starting on port {} (Press Ctrl+C to stop)", "🌐".bright_blue(), port);
        cmd.status()?;
    }

    Ok(())
}

// Helper functions

fn normalize_state(state: &str) -> bool {
    matches!(state, "on" | "enable")
}

fn print_command_result(action: &str, value: &str, response: &str, format: &str) {
    match format {
        "json" => println!("{}", response),
        "compact" => println!("{}", "OK".bright_green()),
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(response) {
                let status = parsed["status"].as_str().unwrap_or("Unknown");
                match status {
                    "Success" => {
                        println!("{} {} {}", "✅".green(), action.bright_white(), value.bright_cyan());
                    }
                    "Scheduled" => {
                        let message = parsed["message"].as_str().unwrap_or("Command scheduled");
                        println!("{} {} {}", "⏱️".bright_blue(), action.bright_white(), message.bright_cyan());
                    }
                    "NegativeAck" => {
                        let message = parsed["message"].as_str().unwrap_or("Command rejected");
                        println!("{} {} failed: {}", "❌".red(), action.bright_white(), message.bright_red());

                        if message.contains("maintenance") {
                            println!(
                                "{} Try: {}",
                                "💡".yellow(),
                                "vesselsim alarm maintenance <subsystem> off".bright_cyan()
                            );
                        } else if message.contains("already being processed") {
                            println!("{} Wait a moment and try again", "💡".yellow());
                        }
                    }
                    "ExecutionFailed" => {
                        let message = parsed["message"].as_str().unwrap_or("Execution failed");
                        println!("{} {} execution failed: {}", "⚠️".yellow(), action.bright_white(), message.bright_red());
                    }
                    "Timeout" => {
                        println!("{} {} timed out", "⏰".yellow(), action.bright_white());
                    }
                    _ => {
                        let message = parsed["message"].as_str().unwrap_or("Unknown error");
                        println!("{} {} status {}: {}", "❓".blue(), action.bright_white(), status.bright_blue(), message);
                    }
                }
            } else {
                println!("{} {}", "✅".green(), "Command completed".bright_green());
            }
        }
    }
}

fn print_diagnostics_result(response: &str, format: &str) {
    match format {
        "json" => println!("{}", response),
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(response) {
                println!("\n{}", "🔍 Diagnostics Report".bright_blue().bold());
                println!("{}", "═════════════════════".bright_blue());

                if let Some(message) = parsed.get("message").and_then(|m| m.as_str()) {
                    if let Ok(report) = serde_json::from_str::<serde_json::Value>(message) {
                        for subsystem in ["fire", "esd", "bilge"] {
                            if let Some(check) = report.get(subsystem) {
                                let result = check.get("result").and_then(|r| r.as_str()).unwrap_or("?");
                                let detail = check.get("detail").and_then(|d| d.as_str()).unwrap_or("");
                                let badge = if result == "Pass" {
                                    "PASS".bright_green()
                                } else {
                                    "FAIL".bright_red()
                                };
                                println!("{:>6}: {} - {}", subsystem, badge, detail);
                            }
                        }
                        return;
                    }
                }

                let status = parsed["status"].as_str().unwrap_or("Unknown");
                if status == "Success" {
                    println!("{} {}", "✅".green(), "All subsystems passed".bright_green());
                } else {
                    println!("{} {}", "❌".red(), "Diagnostics reported failures".bright_red());
                }
            } else {
                println!("{} Failed to parse diagnostics response", "❌".red());
            }
        }
    }
}

fn print_fault_injection_status(response: &str, format: &str) {
    match format {
        "json" => println!("{}", response),
        _ => {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(response) {
                println!("\n{}", "🔧 Fault Injection System Status".bright_blue().bold());
                println!("{}", "═══════════════════════════════".bright_blue());

                if let Some(message) = parsed.get("message").and_then(|m| m.as_str()) {
                    if let Ok(status_data) = serde_json::from_str::<serde_json::Value>(message) {
                        if let Some(config) = status_data.get("config") {
                            let enabled = config.get("enabled").and_then(|v| v.as_bool()).unwrap_or(false);
                            println!(
                                "Status: {}",
                                if enabled { "ENABLED".bright_green() } else { "DISABLED".bright_red() }
                            );

                            if let Some(rate) = config.get("fire_rate_percent").and_then(|v| v.as_f64()) {
                                println!("Fire detection rate: {:.1}%", rate);
                            }
                            if let Some(rate) = config.get("esd_rate_percent").and_then(|v| v.as_f64()) {
                                println!("Shutdown system rate: {:.1}%", rate);
                            }
                            if let Some(rate) = config.get("bilge_rate_percent").and_then(|v| v.as_f64()) {
                                println!("Bilge alarm rate: {:.1}%", rate);
                            }
                        }

                        if let Some(stats) = status_data.get("stats") {
                            println!("\n{}", "📊 Statistics".bright_white().bold());
                            if let Some(total) = stats.get("total_faults_injected").and_then(|v| v.as_u64()) {
                                println!("Total faults injected: {}", total.to_string().bright_cyan());
                            }
                            if let Some(active) = stats.get("current_active_faults").and_then(|v| v.as_u64()) {
                                println!("Currently active faults: {}", active.to_string().bright_yellow());
                            }
                        }
                    }
                }
            } else {
                println!("{} Failed to parse fault injection status", "❌".red());
            }
        }
    }
}

async fn send_command(
    host: &str,
    port: u16,
    command: String,
) -> Result<String, Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", host, port);
    let mut stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("{} Failed to connect to simulator at {}", "❌".red(), addr.bright_white());

            if e.kind() == std::io::ErrorKind::ConnectionRefused {
                eprintln!("{} Server is not running. Start it with:", "💡".yellow());
                eprintln!("   {}", "vesselsim server".bright_cyan());
                eprintln!("   or");
                eprintln!("   {}", "cargo run --bin vesselsim-server".bright_cyan());
            } else {
                eprintln!("{} Network error: {}", "🔌".yellow(), e.to_string().bright_red());
            }

            return Err(e.into());
        }
    };

    match tokio::time::timeout(std::time::Duration::from_secs(5), async {
        stream.write_all(command.as_bytes()).await?;
        stream.write_all(b"\n").await?;

        let mut buffer = vec![0; 4096];
        let n = stream.read(&mut buffer).await?;

        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Server closed connection",
            ));
        }

        let response = String::from_utf8_lossy(&buffer[..n]);
        Ok(response.to_string())
    })
    .await
    {
        Ok(result) => Ok(result?),
        Err(_) => {
            eprintln!("{} Command timed out after 5 seconds", "⏰".yellow());
            Err("Command timeout".into())
        }
    }
}

async fn monitor_status_table(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect((host, port)).await?;

    println!("{}", "┌──────────────────────────────────────────────────────────────────────────┐".bright_white());
    println!("{}", "│                      ⚓ VESSEL SAFETY STATUS MONITOR                     │".bright_blue().bold());
    println!("{}", "├──────────────────────────────────────────────────────────────────────────┤".bright_white());
    println!("{}", "│ Time     │ General │ Fire  │ ESD      │ Bilge │ Power     │ Faults │".bright_white());
    println!("{}", "├──────────────────────────────────────────────────────────────────────────┤".bright_white());

    let mut buffer = vec![0; 8192];

    loop {
        let n = stream.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        let data = String::from_utf8_lossy(&buffer[..n]);

        if let Ok(status) = serde_json::from_str::<serde_json::Value>(&data) {
            let timestamp = status["timestamp"].as_u64().unwrap_or(0);
            let general = status["system"]["general_alarm"].as_bool().unwrap_or(false);
            let fire_alarm = status["fire"]["alarms"]["visual"].as_bool().unwrap_or(false);
            let shutdown = status["esd"]["shutdown_active"].as_bool().unwrap_or(false);
            let bilge_alarm = status["bilge"]["compartments"]
                .as_array()
                .map(|comps| {
                    comps
                        .iter()
                        .any(|c| c["alarm"]["visual"].as_bool().unwrap_or(false))
                })
                .unwrap_or(false);
            let fire_power = status["fire"]["power_source"].as_str().unwrap_or("Main");
            let fault_count = status["faults"].as_array().map(|f| f.len()).unwrap_or(0);

            let time_str = format!("{:>7}s", timestamp / 1000);
            let general_str = if general { " ALARM".bright_red() } else { "NORMAL".bright_green() };
            let fire_str = if fire_alarm { "ALARM".bright_red() } else { "  OK ".bright_green() };
            let esd_str = if shutdown { "SHUTDOWN".bright_red() } else { "  READY ".bright_green() };
            let bilge_str = if bilge_alarm { "ALARM".bright_red() } else { "  OK ".bright_green() };
            let power_str = if fire_power == "Main" {
                "MAIN     ".bright_green()
            } else {
                "EMERGENCY".bright_yellow()
            };
            let fault_str = format!("{:>5}", fault_count);

            println!(
                "│ {} │ {} │ {} │ {} │ {} │ {} │ {} │",
                time_str, general_str, fire_str, esd_str, bilge_str, power_str, fault_str
            );
        }
    }

    Ok(())
}

async fn monitor_status_json(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect((host, port)).await?;
    let mut buffer = vec![0; 8192];

    loop {
        let n = stream.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        let data = String::from_utf8_lossy(&buffer[..n]);
        println!("{}", data);
    }

    Ok(())
}

async fn monitor_status_compact(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut stream = TcpStream::connect((host, port)).await?;
    let mut buffer = vec![0; 8192];

    loop {
        let n = stream.read(&mut buffer).await?;
        if n == 0 {
            break;
        }

        let data = String::from_utf8_lossy(&buffer[..n]);

        if let Ok(status) = serde_json::from_str::<serde_json::Value>(&data) {
            let timestamp = status["timestamp"].as_u64().unwrap_or(0);
            let general = status["system"]["general_alarm"].as_bool().unwrap_or(false);
            let maintenance = status["system"]["maintenance_active"].as_bool().unwrap_or(false);
            let fault_count = status["faults"].as_array().map(|f| f.len()).unwrap_or(0);

            let badge = if general {
                "ALARM".red()
            } else if maintenance {
                "MAINT".yellow()
            } else {
                "OK".green()
            };

            println!("[{}] {} | faults: {}", timestamp / 1000, badge, fault_count);
        }
    }

    Ok(())
}

// Command creation functions

fn add_execution_time_to_command(mut json: serde_json::Value, execution_time: Option<u64>) -> String {
    if let Some(exec_time) = execution_time {
        json["execution_time"] = serde_json::Value::Number(serde_json::Number::from(exec_time));
    }
    json.to_string()
}

fn create_ping_command(execution_time: Option<u64>) -> String {
    let json = serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "Ping"
    });

    add_execution_time_to_command(json, execution_time)
}

fn create_status_command() -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "SystemStatus"
    })
    .to_string()
}

fn create_detector_temp_command(detector: u8, temp_c: f32) -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "SetDetectorTemperature": { "detector": detector, "temp_c": temp_c }
        }
    })
    .to_string()
}

fn create_detector_smoke_command(detector: u8, obscuration: f32) -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "SetDetectorSmoke": { "detector": detector, "obscuration": obscuration }
        }
    })
    .to_string()
}

fn create_water_level_command(compartment: u8, level_mm: f32) -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "SetWaterLevel": { "compartment": compartment, "level_mm": level_mm }
        }
    })
    .to_string()
}

fn create_activate_shutdown_command(station: &str, execution_time: Option<u64>) -> String {
    let station_name = match station {
        "engine-room" => "EngineRoom",
        _ => "Bridge",
    };

    let json = serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "ActivateShutdown": { "station": station_name }
        }
    });

    add_execution_time_to_command(json, execution_time)
}

fn create_reset_shutdown_command() -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "ResetShutdown"
    })
    .to_string()
}

fn create_maintenance_command(subsystem: &str, enabled: bool, expires_at: Option<u64>) -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "SetMaintenanceMode": {
                "target": subsystem_name(subsystem),
                "enabled": enabled,
                "expires_at": expires_at
            }
        }
    })
    .to_string()
}

fn create_acknowledge_command() -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "AcknowledgeAlarms"
    })
    .to_string()
}

fn create_cut_power_command() -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "CutMainPower"
    })
    .to_string()
}

fn create_restore_power_command() -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "RestoreMainPower"
    })
    .to_string()
}

fn create_fault_command(system: &str, fault_type: &str) -> String {
    let fault = match fault_type {
        "failed" => "Failed",
        "offline" => "Offline",
        _ => "Degraded",
    };

    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "SimulateFault": {
                "target": subsystem_name(system),
                "fault_type": fault
            }
        }
    })
    .to_string()
}

fn create_clear_faults_command(system: Option<&str>) -> String {
    let target = system.map(subsystem_name);

    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "ClearFaults": { "target": target }
        }
    })
    .to_string()
}

fn create_diagnostics_command() -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "RunDiagnostics"
    })
    .to_string()
}

fn create_fault_injection_enable_command(enabled: bool) -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": {
            "SetFaultInjection": { "enabled": enabled }
        }
    })
    .to_string()
}

fn create_fault_injection_status_command() -> String {
    serde_json::json!({
        "id": current_timestamp() as u32,
        "timestamp": current_timestamp(),
        "command_type": "GetFaultInjectionStatus"
    })
    .to_string()
}

fn subsystem_name(cli_name: &str) -> &'static str {
    match cli_name {
        "esd" => "EmergencyShutdown",
        "bilge" => "BilgeAlarm",
        _ => "FireDetection",
    }
}

fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
