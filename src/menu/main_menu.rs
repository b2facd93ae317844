use crate::component::image_grid::{AdaptationMethod, BackgroundMode, EnhanceLevel};
use crate::component::pack_assembler::PackMode;
use crate::config::save::save_settings;
use crate::config::types::{Config, SamplingStrategy};
use crate::menu::handlers::{run_cache_cleaner, run_emoji_pack_generator};
use anyhow::Result;
use console::{Term, style};
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const ESC_HINT: &str = "(按 ESC 返回)";

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &Arc<AtomicBool>,
    config: &mut Config,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 表情包產生器 ===").cyan().bold());
    println!("{}", style(ESC_HINT).dim());

    let options = vec![
        "建立靜態表情包 (PNG)",
        "建立動態表情包 (WebM / MP4)",
        "清理快取",
        "設定",
        "離開",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_emoji_pack_generator(term, shutdown_signal, config, PackMode::Static)?;
            Ok(true)
        }
        Some(1) => {
            run_emoji_pack_generator(term, shutdown_signal, config, PackMode::Animated)?;
            Ok(true)
        }
        Some(2) => {
            run_cache_cleaner(term, config)?;
            Ok(true)
        }
        Some(3) => {
            show_settings_menu(term, config)?;
            Ok(true)
        }
        Some(4) => Ok(false),
        None => Ok(false), // ESC
        _ => unreachable!(),
    }
}

/// 設定選單
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<()> {
    loop {
        term.clear_screen()?;

        println!("{}", style("=== 設定 ===").cyan().bold());
        println!("{}", style(ESC_HINT).dim());

        let options = vec![
            "影片取樣方式",
            "預設長寬比調整方式",
            "預設背景處理",
            "預設畫質強化",
            "返回",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇要調整的項目")
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        match selection {
            Some(0) => show_sampling_menu(term, config)?,
            Some(1) => show_method_menu(term, config)?,
            Some(2) => show_background_menu(term, config)?,
            Some(3) => show_enhance_menu(term, config)?,
            Some(4) | None => break,
            _ => unreachable!(),
        }
    }

    Ok(())
}

/// 影片取樣方式
fn show_sampling_menu(term: &Term, config: &mut Config) -> Result<()> {
    let strategies = [SamplingStrategy::Scene, SamplingStrategy::Uniform];
    let current = config.pipeline.sampling_strategy;

    let Some(selected) = select_setting(term, "影片取樣方式", &strategies, current)? else {
        return Ok(());
    };

    if selected != current {
        config.pipeline.sampling_strategy = selected;
        persist(config, &selected)?;
    }
    Ok(())
}

fn show_method_menu(term: &Term, config: &mut Config) -> Result<()> {
    let current = config.preferences.adaptation_method;

    let Some(selected) = select_setting(term, "預設長寬比調整方式", &AdaptationMethod::ALL, current)?
    else {
        return Ok(());
    };

    if selected != current {
        config.preferences.adaptation_method = selected;
        persist(config, &selected)?;
    }
    Ok(())
}

fn show_background_menu(term: &Term, config: &mut Config) -> Result<()> {
    let current = config.preferences.background_mode;

    let Some(selected) = select_setting(term, "預設背景處理", &BackgroundMode::ALL, current)? else {
        return Ok(());
    };

    if selected != current {
        config.preferences.background_mode = selected;
        persist(config, &selected)?;
    }
    Ok(())
}

fn show_enhance_menu(term: &Term, config: &mut Config) -> Result<()> {
    let current = config.preferences.enhancement;

    let Some(selected) = select_setting(term, "預設畫質強化", &EnhanceLevel::ALL, current)? else {
        return Ok(());
    };

    if selected != current {
        config.preferences.enhancement = selected;
        persist(config, &selected)?;
    }
    Ok(())
}

/// 顯示目前值並讓使用者從候選清單中選擇，ESC 回傳 `None`
fn select_setting<T>(term: &Term, title: &str, choices: &[T], current: T) -> Result<Option<T>>
where
    T: Copy + PartialEq + std::fmt::Display,
{
    term.clear_screen()?;

    println!("{}", style(format!("=== {title} ===")).cyan().bold());
    println!("{}", style(ESC_HINT).dim());
    println!("\n{} {}", style("目前設定:").dim(), current);
    println!();

    let items: Vec<String> = choices.iter().map(ToString::to_string).collect();
    let default_index = choices.iter().position(|c| *c == current).unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(title)
        .items(&items)
        .default(default_index)
        .interact_on_opt(term)?;

    Ok(selection.map(|index| choices[index]))
}

fn persist(config: &Config, selected: &dyn std::fmt::Display) -> Result<()> {
    save_settings(config)?;
    println!("\n{} {}", style("設定已儲存:").green(), selected);
    std::thread::sleep(std::time::Duration::from_secs(1));
    Ok(())
}
