use crate::component::EmojiPackGenerator;
use crate::component::pack_assembler::PackMode;
use crate::config::Config;
use crate::pause;
use crate::tools::cache_cleaner::{cache_stats, cleanup_cache};
use crate::tools::file_tools::format_file_size;
use anyhow::Result;
use console::{Term, style};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_emoji_pack_generator(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
    mode: PackMode,
) -> Result<()> {
    let mut generator = EmojiPackGenerator::new(config.clone(), Arc::clone(shutdown_signal));

    if let Err(e) = generator.run(mode) {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
    }

    *config = generator.into_config();
    pause(term)?;
    Ok(())
}

pub fn run_cache_cleaner(term: &Term, config: &Config) -> Result<()> {
    let cache_root = &config.pipeline.cache_root;

    println!("{}", style("=== 快取管理 ===").cyan().bold());

    let before = cache_stats(cache_root);
    println!(
        "  目前快取: {} 個請求目錄, {} 個檔案, {}",
        before.request_dirs,
        before.total_files,
        format_file_size(before.total_bytes)
    );

    match cleanup_cache(cache_root, config.pipeline.cache_max_age()) {
        Ok(report) => {
            println!(
                "  {} 移除 {} 個檔案、{} 個目錄，釋放 {}",
                style("清理完成:").green(),
                report.removed_files,
                report.removed_dirs,
                format_file_size(report.bytes_freed)
            );
        }
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }

    pause(term)?;
    Ok(())
}
