//! Integration test cases.

use colored::Colorize;

use crate::device::{pattern, DeviceClient};

/// Packet size of the CDC bulk endpoints
const PACKET_SIZE: usize = 64;

/// Test result.
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

impl TestResult {
    fn pass() -> Self {
        Self {
            name: String::new(),
            passed: true,
            message: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            name: String::new(),
            passed: false,
            message: Some(message.to_string()),
        }
    }
}

/// Run a test function and print results as it happens.
fn run_test<F>(name: &str, device: &mut DeviceClient, test_fn: F) -> TestResult
where
    F: FnOnce(&mut DeviceClient) -> TestResult,
{
    print!("  {} ... ", name);
    std::io::Write::flush(&mut std::io::stdout()).ok();

    let mut result = test_fn(device);
    result.name = name.to_string();

    if result.passed {
        println!("{}", "PASS".green().bold());
    } else {
        println!("{}", "FAIL".red().bold());
        if let Some(msg) = &result.message {
            println!("    {}", msg.red());
        }
    }

    result
}

/// Run all tests and return results.
pub fn run_all_tests(device: &mut DeviceClient) -> Vec<TestResult> {
    let mut results = Vec::new();

    results.push(run_test("Short text echoes back", device, test_echo_text));
    results.push(run_test("Line endings pass through unchanged", device, test_echo_line_endings));
    results.push(run_test("Every byte value echoes back", device, test_echo_all_bytes));
    results.push(run_test("Exact packet-size write echoes back", device, test_echo_full_packet));
    results.push(run_test("Large transfer echoes back", device, test_large_transfer));
    results.push(run_test("Many small writes keep order", device, test_many_small_writes));

    results
}

/// Print test results summary.
pub fn print_results(results: &[TestResult]) {
    println!("\n{}", "=".repeat(60));
    println!("{}", "Test Results".bold());
    println!("{}", "=".repeat(60));

    let mut passed = 0;
    let mut failed = 0;

    for result in results {
        if result.passed {
            println!("  {} {}", "[PASS]".green().bold(), result.name);
            passed += 1;
        } else {
            println!("  {} {}", "[FAIL]".red().bold(), result.name);
            if let Some(msg) = &result.message {
                println!("         {}", msg.red());
            }
            failed += 1;
        }
    }

    println!("{}", "-".repeat(60));
    println!(
        "  Total: {} passed, {} failed",
        passed.to_string().green(),
        if failed > 0 {
            failed.to_string().red()
        } else {
            failed.to_string().normal()
        }
    );
    println!("{}", "=".repeat(60));
}

/// Compare an echo against what was sent
fn check_echo(sent: &[u8], result: anyhow::Result<Vec<u8>>) -> TestResult {
    match result {
        Ok(echoed) if echoed == sent => TestResult::pass(),
        Ok(echoed) => {
            let first_diff = sent
                .iter()
                .zip(echoed.iter())
                .position(|(a, b)| a != b)
                .unwrap_or(std::cmp::min(sent.len(), echoed.len()));
            TestResult::fail(&format!(
                "Echo mismatch at byte {} (sent {} bytes, got {})",
                first_diff,
                sent.len(),
                echoed.len()
            ))
        }
        Err(e) => TestResult::fail(&format!("Error: {}", e)),
    }
}

// --- Individual Tests ---

fn test_echo_text(device: &mut DeviceClient) -> TestResult {
    let data = b"hello over usb";
    check_echo(data, device.echo(data))
}

fn test_echo_line_endings(device: &mut DeviceClient) -> TestResult {
    let data = b"one\ntwo\r\nthree\r";
    check_echo(data, device.echo(data))
}

fn test_echo_all_bytes(device: &mut DeviceClient) -> TestResult {
    let data = pattern(256);
    check_echo(&data, device.echo_chunked(&data, PACKET_SIZE / 2))
}

fn test_echo_full_packet(device: &mut DeviceClient) -> TestResult {
    // A full packet needs a zero-length packet to end the transfer
    let data = pattern(PACKET_SIZE);
    check_echo(&data, device.echo(&data))
}

fn test_large_transfer(device: &mut DeviceClient) -> TestResult {
    let data = pattern(16 * 1024);
    let start = std::time::Instant::now();
    let result = check_echo(&data, device.echo_chunked(&data, PACKET_SIZE));

    if result.passed {
        let secs = start.elapsed().as_secs_f64();
        print!("({:.1} KiB/s) ", data.len() as f64 / 1024.0 / secs);
    }
    result
}

fn test_many_small_writes(device: &mut DeviceClient) -> TestResult {
    let mut sent = Vec::new();
    for i in 0..200u32 {
        let line = format!("{};", i);
        if let Err(e) = device.send(line.as_bytes()) {
            return TestResult::fail(&format!("Error: {}", e));
        }
        sent.extend_from_slice(line.as_bytes());

        // Keep the device side from backing up
        if sent.len() % PACKET_SIZE < 4 {
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
    }

    let received = device.receive(sent.len());
    check_echo(&sent, received)
}
