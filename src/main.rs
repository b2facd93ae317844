use anyhow::Result;
use console::{Term, style};
use emoji_grid_pack::config::types::Config;
use emoji_grid_pack::init;
use emoji_grid_pack::menu::show_main_menu;
use emoji_grid_pack::signal::setup_shutdown_signal;
use emoji_grid_pack::tools::cache_cleaner::cleanup_cache;
use log::{info, warn};

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal();

    let mut config = Config::new()?;

    // 啟動時先清掉過期的請求目錄
    if let Err(e) = cleanup_cache(&config.pipeline.cache_root, config.pipeline.cache_max_age()) {
        warn!("快取清理失敗: {e}");
    }

    loop {
        match show_main_menu(&term, &shutdown_signal, &mut config) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("再見！").green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style("錯誤:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
