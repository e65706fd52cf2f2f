use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use miette::{Context, IntoDiagnostic};

use skfx_backend_core::BackendOptions;
use skfx_effect::{
    CompileOptions, DeviceBackend, Effect, EffectCompiler, HeadlessDevice, infer_kind,
};
use skfx_ir::{EffectDocument, EffectKind};
use skfx_parser::ParseError;

/// skfx: single-source shader effect compiler
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input effect file
    input: PathBuf,

    /// Effect name (default: file stem)
    #[arg(long)]
    name: Option<String>,

    /// Effect kind: auto, graphics or compute
    #[arg(long, default_value = "auto", value_parser = parse_kind)]
    kind: KindChoice,

    /// Device backend: vulkan, opengl, d3d11 or webgpu
    #[arg(short, long, default_value = "vulkan", value_parser = parse_backend)]
    backend: DeviceBackend,

    /// Cross-compile target, overriding the backend's (glsl, hlsl, json, wgsl)
    #[arg(short, long)]
    target: Option<String>,

    /// Output directory (default: text outputs to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// GLSL version of the glsl target
    #[arg(long, default_value_t = 430)]
    glsl_version: u16,

    /// Emit GLSL ES from the glsl target
    #[arg(long)]
    glsl_es: bool,

    /// HLSL shader model as major*10+minor
    #[arg(long, default_value_t = 50)]
    shader_model: u8,

    /// Keep the GLSL writer's own binding numbers
    #[arg(long)]
    no_sampler_remap: bool,

    /// Dump generated GLSL of every stage to stderr
    #[arg(long)]
    emit_source: bool,

    /// Dump the analysis of every pass to stderr (text or json)
    #[arg(long, num_args = 0..=1, default_missing_value = "text", value_parser = ["text", "json"])]
    emit_analysis: Option<String>,

    /// Compile and assemble without writing output
    #[arg(long)]
    dry_run: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug)]
enum KindChoice {
    Auto,
    Fixed(EffectKind),
}

fn parse_kind(s: &str) -> Result<KindChoice, String> {
    match s {
        "auto" => Ok(KindChoice::Auto),
        _ => s
            .parse()
            .map(KindChoice::Fixed)
            .map_err(|_| format!("invalid kind '{s}', expected auto, graphics, or compute")),
    }
}

fn parse_backend(s: &str) -> Result<DeviceBackend, String> {
    match s {
        "vulkan" => Ok(DeviceBackend::Vulkan),
        "opengl" | "gl" => Ok(DeviceBackend::OpenGl),
        "d3d11" => Ok(DeviceBackend::Direct3D11),
        "webgpu" => Ok(DeviceBackend::WebGpu),
        _ => Err(format!(
            "invalid backend '{s}', expected vulkan, opengl, d3d11, or webgpu"
        )),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Prefixes a parse error with its `file:line:column`.
fn located(path: &Path, source: &str, err: ParseError) -> miette::Report {
    match err.offset() {
        Some(offset) => {
            let (line, column) = skfx_parser::line_col(source, offset);
            miette::miette!("{}:{line}:{column}: {err}", path.display())
        }
        None => miette::miette!("{}: {err}", path.display()),
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // 1. Read source file.
    let source = std::fs::read_to_string(&cli.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", cli.input.display()))?;
    let name = cli.name.clone().unwrap_or_else(|| {
        cli.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "effect".to_string())
    });

    // 2. Parse into passes.
    let document = skfx_parser::parse(&name, &source)
        .map_err(|e| located(&cli.input, &source, e))
        .wrap_err("effect parse failed")?;
    let kind = match cli.kind {
        KindChoice::Auto => infer_kind(&document),
        KindChoice::Fixed(kind) => kind,
    };
    log::info!(
        "effect '{name}': {} pass(es), {kind}, {} device",
        document.passes.len(),
        cli.backend
    );

    // 3. Optionally dump analysis and generated sources to stderr.
    if cli.emit_analysis.is_some() || cli.emit_source {
        emit_debug(&cli, &document, kind)?;
    }

    // 4. Compile and assemble.
    let options = CompileOptions {
        kind,
        cross_target: cli.target.clone(),
        backend_options: BackendOptions {
            glsl_version: cli.glsl_version,
            glsl_es: cli.glsl_es,
            shader_model: cli.shader_model,
            remap_combined_samplers: !cli.no_sampler_remap,
        },
    };
    let device = HeadlessDevice::new(cli.backend);
    let effect = EffectCompiler::new(&device)
        .with_options(options)
        .compile_document(&document)
        .map_err(|e| miette::miette!("{e}"))
        .wrap_err_with(|| format!("failed to compile effect '{name}'"))?;

    // 5. Print diagnostics.
    for pass in &effect.passes {
        for translated in &pass.translated {
            for diag in &translated.diagnostics {
                eprintln!("{:?}: {} {}: {}", diag.level, pass.name, translated.stage, diag.message);
            }
        }
    }

    // 6. Dry-run: stop here.
    if cli.dry_run {
        return Ok(());
    }

    // 7. Write output.
    match &cli.output {
        Some(dir) => write_outputs(dir, &effect),
        None => print_outputs(&effect),
    }
}

fn emit_debug(cli: &Cli, document: &EffectDocument, kind: EffectKind) -> miette::Result<()> {
    for pass in &document.passes {
        let analysis = skfx_analysis::analyze(pass)
            .map_err(|e| miette::miette!("{e}"))
            .wrap_err_with(|| format!("analysis of pass '{}' failed", pass.name))?;
        match cli.emit_analysis.as_deref() {
            Some("json") => {
                let json = serde_json::to_string_pretty(&analysis).into_diagnostic()?;
                eprintln!("// pass '{}'\n{json}", pass.name);
            }
            Some(_) => eprintln!("Pass {}:\n{}", pass.name, skfx_ir::dump_analysis(&analysis)),
            None => {}
        }
        if cli.emit_source {
            let transpiled = skfx_transpile::transpile_pass(pass, &analysis, kind)
                .map_err(|e| miette::miette!("{e}"))?;
            for stage in &transpiled.stages {
                eprintln!("// pass '{}', {} stage\n{}", pass.name, stage.stage, stage.source);
            }
        }
    }
    Ok(())
}

fn write_file(path: &Path, contents: impl AsRef<[u8]>) -> miette::Result<()> {
    std::fs::write(path, contents)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to write {}", path.display()))
}

fn write_outputs(dir: &Path, effect: &Effect<HeadlessDevice>) -> miette::Result<()> {
    std::fs::create_dir_all(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to create {}", dir.display()))?;
    for pass in &effect.passes {
        for stage in &pass.stages {
            let path = dir.join(format!("{}.{}.spv", pass.name, stage.stage));
            write_file(&path, stage.to_bytes())?;
        }
        for translated in &pass.translated {
            let path = dir.join(format!(
                "{}.{}.{}",
                pass.name, translated.stage, translated.extension
            ));
            write_file(&path, &translated.text)?;
        }
        let layout = serde_json::to_string_pretty(&pass.layout_elements).into_diagnostic()?;
        write_file(&dir.join(format!("{}.layout.json", pass.name)), layout)?;
    }
    Ok(())
}

fn print_outputs(effect: &Effect<HeadlessDevice>) -> miette::Result<()> {
    if effect.passes.iter().all(|p| p.translated.is_empty()) {
        return Err(miette::miette!(
            "SPIR-V output needs an --output directory (or pick a text --target)"
        ));
    }
    for pass in &effect.passes {
        for translated in &pass.translated {
            println!("// pass '{}', {} stage", pass.name, translated.stage);
            print!("{}", translated.text);
            if !translated.text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
