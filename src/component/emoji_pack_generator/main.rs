use crate::component::animation_encoder::{AnimationParams, MAX_DURATION_SECONDS, MAX_FPS};
use crate::component::image_grid::{AdaptationMethod, BackgroundMode, EnhanceLevel};
use crate::component::pack_assembler::{PackAssembler, PackMode, ProcessRequest, ProcessResult};
use crate::config::Config;
use crate::config::save::{add_recent_path, save_settings};
use crate::tools::cache_cleaner::request_output_dir;
use crate::tools::file_tools::format_file_size;
use crate::tools::path_validator::validate_file_exists;
use crate::tools::progress::ProgressEvent;
use anyhow::Result;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

const NEW_PATH_LABEL: &str = "輸入新路徑...";

/// 互動式表情包產生器
pub struct EmojiPackGenerator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl EmojiPackGenerator {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 回傳更新過使用者偏好的設定
    #[must_use]
    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn run(&mut self, mode: PackMode) -> Result<()> {
        let title = match mode {
            PackMode::Static => "=== 建立靜態表情包 ===",
            PackMode::Animated => "=== 建立動態表情包 ===",
        };
        println!("{}", style(title).cyan().bold());

        let media_path = self.prompt_media_path()?;
        validate_file_exists(&media_path)?;

        let grid_x = self.prompt_grid("欄數 (grid_x)", self.config.preferences.grid_x)?;
        let grid_y = self.prompt_grid("列數 (grid_y)", self.config.preferences.grid_y)?;
        let method = self.prompt_method()?;
        let enhancement = self.prompt_enhancement()?;
        let background = self.prompt_background()?;
        let pack_name = self.prompt_pack_name()?;

        let output_dir = request_output_dir(&self.config.pipeline.cache_root);

        let mut request = ProcessRequest::new(&media_path, grid_x, grid_y, &output_dir)
            .with_method(method)
            .with_enhancement(enhancement)
            .with_background(background);
        if let Some(name) = pack_name {
            request = request.with_pack_name(name);
        }
        if mode == PackMode::Animated {
            let params = self.prompt_animation()?;
            request = request.animated(params);
        }

        self.remember(&request);

        println!();
        println!("{}", style("開始處理...").cyan());

        let assembler = PackAssembler::new(&self.config, Arc::clone(&self.shutdown_signal));
        let progress_bar = create_progress_bar();
        let on_progress = |event: &ProgressEvent| {
            if event.total > 0 {
                progress_bar.set_length(event.total as u64);
                progress_bar.set_position(event.step as u64);
            }
            progress_bar.set_message(format!("[{}] {}", event.stage, event.message));
        };

        let outcome = assembler.process(&request, &on_progress);

        match outcome {
            Ok(result) => {
                progress_bar.finish_with_message("完成");
                print_summary(&result);
            }
            Err(e) => {
                progress_bar.abandon_with_message("處理失敗");
                println!("{} {}", style("錯誤:").red().bold(), e.user_message());
            }
        }

        Ok(())
    }

    fn prompt_media_path(&self) -> Result<PathBuf> {
        let recent = &self.config.preferences.recent_paths;

        if !recent.is_empty() {
            let mut items: Vec<&str> = recent.iter().map(String::as_str).collect();
            items.push(NEW_PATH_LABEL);

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("請選擇圖片或影片")
                .items(&items)
                .default(0)
                .interact()?;

            if selection < recent.len() {
                return Ok(PathBuf::from(&recent[selection]));
            }
        }

        let path: String = Input::new()
            .with_prompt("請輸入圖片或影片路徑")
            .interact_text()?;
        Ok(PathBuf::from(path.trim()))
    }

    fn prompt_grid(&self, prompt: &str, default: u32) -> Result<u32> {
        let min = self.config.pipeline.min_grid_size.max(1);
        let max = self.config.pipeline.max_grid_size.max(min);

        let value: u32 = Input::new()
            .with_prompt(format!("{prompt} [{min}-{max}]"))
            .default(default.clamp(min, max))
            .validate_with(|v: &u32| -> Result<(), String> {
                if (min..=max).contains(v) {
                    Ok(())
                } else {
                    Err(format!("請輸入 {min} 到 {max} 之間的數字"))
                }
            })
            .interact_text()?;
        Ok(value)
    }

    fn prompt_method(&self) -> Result<AdaptationMethod> {
        let labels = ["pad（補白邊，不裁切）", "stretch（拉伸）", "crop（置中裁切）"];
        let default_index = AdaptationMethod::ALL
            .iter()
            .position(|m| *m == self.config.preferences.adaptation_method)
            .unwrap_or(0);

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("長寬比調整方式")
            .items(&labels)
            .default(default_index)
            .interact()?;
        Ok(AdaptationMethod::ALL[selection])
    }

    fn prompt_background(&self) -> Result<BackgroundMode> {
        let labels: Vec<String> = BackgroundMode::ALL.iter().map(ToString::to_string).collect();
        let default_index = BackgroundMode::ALL
            .iter()
            .position(|m| *m == self.config.preferences.background_mode)
            .unwrap_or(0);

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("背景處理")
            .items(&labels)
            .default(default_index)
            .interact()?;
        Ok(BackgroundMode::ALL[selection])
    }

    fn prompt_enhancement(&self) -> Result<EnhanceLevel> {
        let labels: Vec<String> = EnhanceLevel::ALL.iter().map(ToString::to_string).collect();
        let default_index = EnhanceLevel::ALL
            .iter()
            .position(|l| *l == self.config.preferences.enhancement)
            .unwrap_or(0);

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("畫質強化")
            .items(&labels)
            .default(default_index)
            .interact()?;
        Ok(EnhanceLevel::ALL[selection])
    }

    fn prompt_pack_name(&self) -> Result<Option<String>> {
        let name: String = Input::new()
            .with_prompt("表情包名稱（留空自動產生）")
            .allow_empty(true)
            .interact_text()?;
        let name = name.trim();
        Ok((!name.is_empty()).then(|| name.to_string()))
    }

    fn prompt_animation(&self) -> Result<AnimationParams> {
        let fps: u32 = Input::new()
            .with_prompt(format!("幀率 [1-{MAX_FPS}]"))
            .default(self.config.preferences.fps.clamp(1, MAX_FPS))
            .validate_with(|v: &u32| -> Result<(), String> {
                if (1..=MAX_FPS).contains(v) {
                    Ok(())
                } else {
                    Err(format!("請輸入 1 到 {MAX_FPS}"))
                }
            })
            .interact_text()?;

        let default_duration = self.config.preferences.duration_seconds;
        let duration: f64 = Input::new()
            .with_prompt(format!("長度（秒，最多 {MAX_DURATION_SECONDS}）"))
            .default(if default_duration > 0.0 && default_duration <= MAX_DURATION_SECONDS {
                default_duration
            } else {
                MAX_DURATION_SECONDS
            })
            .validate_with(|v: &f64| -> Result<(), String> {
                if *v > 0.0 && *v <= MAX_DURATION_SECONDS {
                    Ok(())
                } else {
                    Err(format!("請輸入大於 0 且不超過 {MAX_DURATION_SECONDS} 的秒數"))
                }
            })
            .interact_text()?;

        Ok(AnimationParams::new(fps, duration)?)
    }

    /// 記住本次的選擇，下次作為預設值
    fn remember(&mut self, request: &ProcessRequest) {
        let preferences = &mut self.config.preferences;
        preferences.grid_x = request.grid_x;
        preferences.grid_y = request.grid_y;
        preferences.adaptation_method = request.adaptation_method;
        preferences.background_mode = request.background;
        preferences.enhancement = request.enhancement;
        if let Some(params) = request.animation {
            preferences.fps = params.fps;
            preferences.duration_seconds = params.duration_seconds;
        }
        add_recent_path(preferences, &request.media_path.to_string_lossy());

        if let Err(e) = save_settings(&self.config) {
            warn!("無法儲存偏好設定: {e:#}");
        } else {
            info!("已更新偏好設定");
        }
    }
}

fn create_progress_bar() -> ProgressBar {
    let progress_bar = ProgressBar::new(1);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    progress_bar
}

fn print_summary(result: &ProcessResult) {
    let metadata = &result.metadata;

    println!();
    println!("{}", style("=== 處理結果 ===").cyan().bold());
    println!("  表情包名稱: {}", style(&metadata.pack_name).green());
    println!(
        "  表情數量: {} ({}, {})",
        style(metadata.emoji_count).green(),
        metadata.format,
        metadata.size
    );
    if let (Some(fps), Some(duration)) = (metadata.fps, metadata.duration_seconds) {
        println!("  動畫: {fps} fps, {duration:.1}s");
    }
    if !metadata.codecs.is_empty() {
        let codecs: Vec<String> = metadata.codecs.iter().map(ToString::to_string).collect();
        println!("  編碼器: {}", codecs.join(", "));
    }
    if let Some(note) = &metadata.note {
        println!("  {}", style(note).yellow());
    }

    let archive_size = fs::metadata(&result.archive_path)
        .map(|m| format_file_size(m.len()))
        .unwrap_or_else(|_| "?".to_string());
    println!(
        "  封存檔: {} ({archive_size})",
        style(result.archive_path.display()).cyan()
    );
    println!("  中繼資料: {}", result.metadata_path.display());
    println!("  耗時: {} ms", metadata.elapsed_ms);
}
