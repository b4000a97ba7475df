//! Console progress line: the single consumer of progress events.

use std::io::Write;
use std::sync::mpsc;
use std::thread;

use hlsget_core::progress::ProgressStats;

/// Spawns the renderer thread. It exits when every sender is dropped.
pub(crate) fn spawn(rx: mpsc::Receiver<ProgressStats>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut rendered = false;
        for stats in rx {
            rendered = true;
            let line = format_line(&stats);
            print!("\r{}", line);
            let _ = std::io::stdout().flush();
        }
        if rendered {
            println!();
        }
    })
}

fn format_line(stats: &ProgressStats) -> String {
    let mut line = format!(
        "Progress: {}/{} [{:.2}%] Speed: {:.2} segments/sec",
        stats.completed,
        stats.total,
        stats.fraction() * 100.0,
        stats.segments_per_sec(),
    );
    match stats.eta_secs() {
        Some(eta) => {
            line.push_str(&format!(
                " ETA: {:.0} min {:.0} sec",
                (eta / 60.0).floor(),
                eta % 60.0
            ));
        }
        None => line.push_str(" ETA: --"),
    }
    line
}
