mod input;

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser};
use handlebars::{Handlebars, RenderErrorReason};
use serde_json::Value;
use spritepack_core::{build_description, compose_texture, generate_sprite_id, pack_sprites, remove_extension};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "spritepack",
    about = "Pack sprite sheets into texture atlases",
    version
)]
struct Cli {
    /// Input description file; '-' or absent reads standard input
    input: Option<PathBuf>,
    /// Directory output textures are written to
    #[arg(short = 'o', long, default_value = ".")]
    output_path: PathBuf,
    /// Description output file; 'stdout' writes to standard output
    #[arg(short = 'f', long)]
    output_file: Option<String>,
    /// Template for the description output
    #[arg(short, long)]
    template: Option<PathBuf>,
    /// Draw sprite rects, pivot points and polygons on the output textures
    #[arg(long, default_value_t = false)]
    debug: bool,
    /// Complete sheets without a sprite list from their pixels
    #[arg(long, default_value_t = false)]
    autocomplete: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("spritepack: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let (text, base_dir) = read_input(cli.input.as_deref())?;
    let doc: input::InputDoc =
        serde_yaml::from_str(&text).context("parse input description")?;

    let mut sprites = input::build_sprites(&doc, &base_dir, cli.autocomplete)?;
    info!(sprites = sprites.len(), sheets = doc.sheets.len(), "parsed input");

    let textures = pack_sprites(&mut sprites)?;
    info!(textures = textures.len(), "packed");

    for texture in &textures {
        let canvas = compose_texture(texture, &sprites, cli.debug);
        let dir = cli.output_path.join(&texture.path);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        let file = dir.join(&texture.filename);
        canvas
            .save(&file)
            .with_context(|| format!("write {}", file.display()))?;
        info!(file = %file.display(), width = texture.width, height = texture.height, "wrote texture");
    }

    if let Some(output_file) = &cli.output_file {
        let description = build_description(&sprites, &textures);
        let rendered = match &cli.template {
            Some(template) => {
                let source = fs::read_to_string(template)
                    .with_context(|| format!("read {}", template.display()))?;
                render_template(&source, &description)?
            }
            None => serde_json::to_string_pretty(&description)?,
        };
        if output_file == "stdout" {
            println!("{rendered}");
        } else {
            let file = cli.output_path.join(output_file);
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            fs::write(&file, rendered).with_context(|| format!("write {}", file.display()))?;
            info!(file = %file.display(), "wrote description");
        }
    }
    Ok(())
}

fn read_input(input: Option<&Path>) -> anyhow::Result<(String, PathBuf)> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let text =
                fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            let base = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            Ok((text, base))
        }
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("read standard input")?;
            Ok((text, PathBuf::from(".")))
        }
    }
}

fn render_template(source: &str, description: &Value) -> anyhow::Result<String> {
    let mut registry = Handlebars::new();
    registry.register_helper(
        "getId",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output|
             -> handlebars::HelperResult {
                let sprite = sprite_param(h)?;
                out.write(&sprite_id(sprite))?;
                Ok(())
            },
        ),
    );
    registry.register_helper(
        "getIdOrFilename",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output|
             -> handlebars::HelperResult {
                let sprite = sprite_param(h)?;
                let id = sprite.get("id").and_then(Value::as_str).unwrap_or_default();
                if id.is_empty() {
                    let filename = sprite
                        .get("sourceFilename")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    out.write(filename)?;
                } else {
                    out.write(id)?;
                }
                Ok(())
            },
        ),
    );
    registry.register_helper(
        "removeExtension",
        Box::new(
            |h: &handlebars::Helper,
             _: &Handlebars,
             _: &handlebars::Context,
             _: &mut handlebars::RenderContext,
             out: &mut dyn handlebars::Output|
             -> handlebars::HelperResult {
                let value = h
                    .param(0)
                    .and_then(|p| p.value().as_str())
                    .ok_or_else(|| {
                        RenderErrorReason::ParamNotFoundForIndex("removeExtension", 0)
                    })?;
                out.write(&remove_extension(value))?;
                Ok(())
            },
        ),
    );
    registry
        .register_template_string("description", source)
        .map_err(|e| anyhow::anyhow!("invalid template: {e}"))?;
    let rendered = registry
        .render("description", description)
        .context("render template")?;
    Ok(rendered)
}

fn sprite_param<'a>(h: &'a handlebars::Helper) -> Result<&'a Value, handlebars::RenderError> {
    h.param(0)
        .map(|p| p.value())
        .ok_or_else(|| RenderErrorReason::ParamNotFoundForIndex("sprite helper", 0).into())
}

fn sprite_id(sprite: &Value) -> String {
    let id = sprite.get("id").and_then(Value::as_str).unwrap_or_default();
    if id.is_empty() {
        let index = sprite.get("index").and_then(Value::as_i64).unwrap_or(0);
        generate_sprite_id(index as i32)
    } else {
        id.to_string()
    }
}

fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
