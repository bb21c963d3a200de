//! Integration tests for the usb-stdio-reset firmware.
//!
//! Run after flashing the firmware. The default command exercises the echo
//! stream; `bootsel` and `reset` reboot the device.

mod device;
mod reset;
mod tests;

use clap::{Parser, Subcommand};
use colored::Colorize;

use device::{resolve_port, touch_bootsel, DeviceClient};
use reset::{send_reset, ResetMode};
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for usb-stdio-reset firmware")]
struct Args {
    /// Serial port for the device (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto", global = true)]
    port: String,

    /// Baud rate (ignored by the device, anything but 1200 is safe)
    #[arg(short, long, default_value = "115200", global = true)]
    baud: u32,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the echo tests (default)
    Test,
    /// Reboot into the bootloader by opening the port at 1200 baud
    Bootsel,
    /// Reboot through a vendor request on the reset interface
    Reset {
        #[arg(value_enum, default_value = "flash")]
        mode: ResetMode,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command.unwrap_or(Command::Test) {
        Command::Test => run_tests(&args.port, args.baud),
        Command::Bootsel => {
            let port = resolve_port(&args.port)?;
            touch_bootsel(&port)?;
            println!("{} {}", "Requested bootloader via".green(), port);
            Ok(())
        }
        Command::Reset { mode } => {
            let interface = send_reset(mode)?;
            println!(
                "{} {:?} {} {}",
                "Sent".green(),
                mode,
                "request to interface".green(),
                interface
            );
            Ok(())
        }
    }
}

fn run_tests(port_arg: &str, baud: u32) -> anyhow::Result<()> {
    // Resolve port (auto-detect if "auto")
    let port = resolve_port(port_arg)?;

    println!("{}", "usb-stdio-reset Integration Tests".bold());
    println!("Port: {}", port);
    println!();

    println!("Connecting to device...");
    let mut device = DeviceClient::new(&port, baud)?;

    // Let the device notice DTR, then drop anything it logged meanwhile
    std::thread::sleep(std::time::Duration::from_millis(200));
    device.drain_buffer()?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&mut device);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
