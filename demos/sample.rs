//! Sample caller that updates a file and restarts itself.
//!
//! ```bash
//! echo old > sample.txt
//! echo new > sample.txt.new
//! cargo run --example sample -- update   # downloads the helper, then gets killed
//! cargo run --example sample             # restarted run: removes the helper
//! ```

use anyhow::Result;
use update_helper::models::UpdateRequest;
use update_helper::session::UpdateSession;
use update_helper::utils::progress::terminal_progress;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    let session = UpdateSession::new().await?;

    println!("sample start");
    if args.get(1).map(String::as_str) == Some("update") {
        // Restart without the "update" argument so the new run cleans up
        let restart = args[..1].iter().map(|a| format!("\"{a}\"")).collect::<Vec<_>>().join(" ");
        let request = UpdateRequest::new("sample.txt.new", "sample.txt")
            .kill(std::process::id())
            .wait(1000)
            .execute(restart)
            .progress({
                let bars = terminal_progress();
                move |step, fraction| bars(step, fraction)
            });
        session.update(request).await?;
    } else {
        let outcome = session.cleanup().await?;
        println!("cleanup: {outcome:?}");
    }
    println!("sample end");

    Ok(())
}
