use std::{
    env,
    io::{self, Write},
    path::PathBuf,
};

use henkan_core::converter::Converter;
use henkan_core::model::Profile;
use henkan_core::predictor::Predictor;
use henkan_engine::engine::Engine;
use henkan_engine::request::{DataSource, ReloadStatus};
use henkan_kana::romaji_to_hiragana;

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts = parse_args();
    let dict_dir = opts.dict.unwrap_or_else(default_dict_dir);
    let profile = if opts.mobile { Profile::Mobile } else { Profile::Desktop };

    tracing::info!(dir = %dict_dir.display(), ?profile, "启动");
    let mut engine = Engine::new(DataSource::Directory(dict_dir.clone()), profile);
    let response = engine.reload_and_wait();
    if response.status != ReloadStatus::Installed {
        // 加载失败也能进 REPL（兜底引擎），:reload 可重试
        eprintln!(
            "快照加载失败: {}",
            response.error.as_deref().unwrap_or("unknown")
        );
    }

    repl(&mut engine, &dict_dir)
}

struct Options {
    dict: Option<PathBuf>,
    mobile: bool,
}

fn parse_args() -> Options {
    let mut opts = Options { dict: None, mobile: false };
    let mut args = env::args().skip(1);
    while let Some(a) = args.next() {
        if a == "--dict" {
            if let Some(p) = args.next() {
                opts.dict = Some(PathBuf::from(p));
            }
        }
        if a == "--mobile" {
            opts.mobile = true;
        }
        if a == "--help" || a == "-h" {
            print_help();
        }
    }
    opts
}

fn print_help() -> ! {
    println!("用法：henkan_cli [--dict <快照目录>] [--mobile]\n交互：按行输入罗马字（回车确认），随后输入 1-9 选择候选；直接回车默认选 1；输入 0 上屏原串\n命令：:q 退出；:reload 重新加载快照；:version 显示数据版本");
    std::process::exit(0);
}

fn default_dict_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("asset")
}

fn repl(engine: &mut Engine, dict_dir: &PathBuf) -> io::Result<()> {
    let mut out = io::stdout();
    let mut line = String::new();
    writeln!(
        out,
        "henkan demo (ローマ字→かな→漢字 CLI) | dict: {} | version: {}",
        dict_dir.display(),
        display_version(engine)
    )?;
    writeln!(out, "输入罗马字后回车。输入 :q 退出。")?;
    out.flush()?;

    loop {
        // 每个 tick 驱动一次重载状态机（:reload 发出的请求在这里落地）
        engine.maybe_build_data_loader();
        if let Some(r) = engine.maybe_reload_engine() {
            match r.status {
                ReloadStatus::Installed => {
                    writeln!(out, "(已切换到新快照 id={} version={})", r.id, engine.data_version())?
                }
                ReloadStatus::Failed => writeln!(
                    out,
                    "(重载失败: {})",
                    r.error.as_deref().unwrap_or("unknown")
                )?,
                _ => {}
            }
        }

        line.clear();
        print!("romaji>");
        out.flush()?;
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == ":q" || input == ":quit" || input == ":exit" {
            break;
        }
        if input == ":version" {
            writeln!(out, "version: {}", display_version(engine))?;
            continue;
        }
        if input == ":reload" {
            let r = engine.reload();
            writeln!(out, "(重载请求已受理 id={}，后台构建中)", r.id)?;
            continue;
        }

        let raw = sanitize_input(input);
        if raw.is_empty() {
            writeln!(out, "(忽略：只接受 a-z、- 和 ' )")?;
            continue;
        }
        let reading = romaji_to_hiragana(&raw);
        println!("--------------------");
        println!("> {reading}");

        let mut candidates = engine.converter().convert(&reading, 9);
        if candidates.is_empty() {
            candidates = engine.predictor().predict(&reading, 9);
        }
        if candidates.is_empty() {
            writeln!(out, "commit: {reading}")?;
            continue;
        }
        for (i, c) in candidates.iter().enumerate() {
            let n = i + 1;
            match &c.comment {
                Some(comment) => writeln!(out, "{n}. {}\t({comment})", c.text)?,
                None => writeln!(out, "{n}. {}", c.text)?,
            }
        }

        line.clear();
        print!("select [1-{}] (Enter=1, 0=かな)> ", candidates.len().min(9));
        out.flush()?;
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let sel = line.trim();
        if sel == "0" {
            writeln!(out, "commit: {reading}")?;
            continue;
        }
        let idx = if sel.is_empty() {
            Some(0usize)
        } else {
            sel.parse::<usize>()
                .ok()
                .and_then(|n| (1..=candidates.len()).contains(&n).then_some(n - 1))
        };
        match idx {
            Some(i) => writeln!(out, "commit: {}", candidates[i].text)?,
            None => writeln!(out, "无效选择，请输入 1-{} / 0 / 直接回车", candidates.len())?,
        }
    }

    Ok(())
}

fn display_version(engine: &Engine) -> String {
    let v = engine.data_version();
    if v.is_empty() { "(未加载)".to_string() } else { v.to_string() }
}

fn sanitize_input(s: &str) -> String {
    let mut out = String::new();
    for ch in s.chars() {
        // ひらがな直接放行（跳过罗马字转换的用户）
        if ch.is_ascii_alphabetic() || ch == '\'' || ch == '-' || !ch.is_ascii() {
            out.push(ch.to_ascii_lowercase());
        }
    }
    out
}
