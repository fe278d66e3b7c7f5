use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::time::SystemTime;

use anyhow::{bail, Context};
use chrono::{DateTime, Local};
use colored::Colorize;

use blobfs_core::{Bucket, ListOptions, WriteOptions};
use blobfs_local::FileBucket;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let bucket = FileBucket::open(&cli.root)?;
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Put(args) => cmd_put(&bucket, args, json),
        Command::Cat(args) => cmd_cat(&bucket, args),
        Command::Stat(args) => cmd_stat(&bucket, args, json),
        Command::Ls(args) => cmd_ls(&bucket, args, json),
        Command::Rm(args) => cmd_rm(&bucket, args, json),
    }
}

fn parse_metadata(pairs: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut metadata = BTreeMap::new();
    for pair in pairs {
        let Some((k, v)) = pair.split_once('=') else {
            bail!("metadata entry {pair:?} is not of the form key=value");
        };
        metadata.insert(k.to_string(), v.to_string());
    }
    Ok(metadata)
}

fn local_time(t: SystemTime) -> String {
    DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn cmd_put(bucket: &FileBucket, args: PutArgs, json: bool) -> anyhow::Result<()> {
    let data = match &args.file {
        Some(path) => fs::read(path).with_context(|| format!("reading {path}"))?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf).context("reading stdin")?;
            buf
        }
    };
    let metadata = parse_metadata(&args.meta)?;
    let size = data.len();
    bucket.write_all(
        &args.key,
        &args.content_type,
        &data,
        WriteOptions::with_metadata(metadata),
    )?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "key": args.key, "size": size })
        );
    } else {
        println!(
            "{} Stored {} ({} bytes, {})",
            "✓".green().bold(),
            args.key.bold(),
            size,
            args.content_type.cyan()
        );
    }
    Ok(())
}

fn cmd_cat(bucket: &FileBucket, args: CatArgs) -> anyhow::Result<()> {
    let mut reader = bucket.reader(&args.key, args.offset, args.length)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    io::copy(&mut reader, &mut out).context("streaming blob to stdout")?;
    out.flush()?;
    reader.close()?;
    Ok(())
}

fn cmd_stat(bucket: &FileBucket, args: StatArgs, json: bool) -> anyhow::Result<()> {
    let attrs = bucket.attributes(&args.key)?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "key": args.key,
                "content_type": attrs.content_type,
                "size": attrs.size,
                "mod_time": DateTime::<Local>::from(attrs.mod_time).to_rfc3339(),
                "metadata": attrs.metadata,
            })
        );
        return Ok(());
    }
    println!("{}", args.key.bold());
    println!("  Content-Type: {}", attrs.content_type.cyan());
    println!("  Size: {} bytes", attrs.size);
    println!("  Modified: {}", local_time(attrs.mod_time));
    for (k, v) in &attrs.metadata {
        println!("  {}: {}", k.yellow(), v);
    }
    Ok(())
}

fn cmd_ls(bucket: &FileBucket, args: LsArgs, json: bool) -> anyhow::Result<()> {
    let page = bucket.list(&ListOptions {
        prefix: args.prefix,
        page_token: args.page_token,
        page_size: args.page_size,
    })?;
    if json {
        let objects: Vec<_> = page
            .objects
            .iter()
            .map(|o| {
                serde_json::json!({
                    "key": o.key,
                    "size": o.size,
                    "mod_time": DateTime::<Local>::from(o.mod_time).to_rfc3339(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "objects": objects,
                "next_page_token": page.next_page_token,
            })
        );
        return Ok(());
    }
    for o in &page.objects {
        println!(
            "{:>12}  {}  {}",
            o.size,
            local_time(o.mod_time).dimmed(),
            o.key
        );
    }
    if let Some(token) = &page.next_page_token {
        println!("{}", format!("more… (--page-token {token})").dimmed());
    }
    Ok(())
}

fn cmd_rm(bucket: &FileBucket, args: RmArgs, json: bool) -> anyhow::Result<()> {
    bucket.delete(&args.key)?;
    if json {
        println!("{}", serde_json::json!({ "deleted": args.key }));
    } else {
        println!("{} Deleted {}", "✓".green().bold(), args.key.bold());
    }
    Ok(())
}
