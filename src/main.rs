//! gtp5g-decode entry point.
//!
//! Reads strace output line by line from stdin and prints every decoded
//! gtp5g control message. Intended usage:
//!
//! ```text
//! sudo strace -f -e trace=sendmsg,recvmsg -xx -s 65535 -p <UPF_PID> 2>&1 | gtp5g-decode
//! ```

use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use env_logger::Env;
use log::{error, info, warn};

use gtp5g_decode::{family, message, trace, DEFAULT_FAMILY_ID};

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let family_id = match family::detect_family_id() {
        Ok(id) => {
            info!("detected gtp5g family id: {} (0x{:x})", id, id);
            id
        }
        Err(err) => {
            warn!(
                "could not detect gtp5g family id ({}), defaulting to {}",
                err, DEFAULT_FAMILY_ID
            );
            DEFAULT_FAMILY_ID
        }
    };

    println!("[Init] Decoder started. Target Family ID: {}", family_id);
    println!("[Init] Waiting for strace input...");

    let lines_seen = Arc::new(AtomicU64::new(0));
    {
        // The read below blocks, so the summary has to come from the handler
        let lines_seen = Arc::clone(&lines_seen);
        if let Err(err) = ctrlc::set_handler(move || {
            println!(
                "\n[Exit] Decoder stopped. Processed {} lines.",
                lines_seen.load(Ordering::SeqCst)
            );
            process::exit(0);
        }) {
            warn!("could not install SIGINT handler: {}", err);
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => break,
            Err(err) => {
                error!("stdin read failed: {}", err);
                break;
            }
        };
        lines_seen.fetch_add(1, Ordering::SeqCst);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            process_line(&line, family_id, &mut stdout);
        }));
        if outcome.is_err() {
            // The panic hook has already written the trace to stderr
            error!("unexpected failure while processing a line");
            let snippet: String = line.chars().take(200).collect();
            error!("while processing line: {}...", snippet);
            process::exit(1);
        }
    }

    println!(
        "\n[Exit] Decoder stopped. Processed {} lines.",
        lines_seen.load(Ordering::SeqCst)
    );
}

fn process_line(line: &str, family_id: u16, stdout: &mut io::Stdout) {
    let Some((envelope, buf)) = trace::extract_message(line, family_id) else {
        return;
    };
    let Some(decoded) = message::decode(envelope, &buf) else {
        return;
    };
    // Flush per message so a slow live pipe still shows output immediately
    let _ = writeln!(stdout, "{}", decoded);
    let _ = stdout.flush();
}
