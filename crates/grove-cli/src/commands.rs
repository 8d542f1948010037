use std::borrow::Cow;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use colored::Colorize;
use grove_store::{
    init_store, EntryMode, LooseObjectStore, LooseStoreConfig, ObjectKind, ObjectStore,
    StoredObject, Tree, TreeEntry, TypedObject,
};
use grove_types::ObjectId;
use serde::Serialize;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let store_root = cli.store.as_path();
    match cli.command {
        Command::Init(args) => cmd_init(store_root, args),
        Command::HashObject(args) => cmd_hash_object(store_root, cli.format, args),
        Command::CatFile(args) => cmd_cat_file(store_root, args),
        Command::LsTree(args) => cmd_ls_tree(store_root, cli.format, args),
        Command::Mktree(args) => cmd_mktree(store_root, args),
    }
}

fn open_store(root: &Path) -> anyhow::Result<LooseObjectStore> {
    debug!(root = %root.display(), "opening object store");
    LooseObjectStore::open(root, LooseStoreConfig::default())
        .with_context(|| format!("cannot open object store at {}", root.display()))
}

fn parse_id(text: &str) -> anyhow::Result<ObjectId> {
    ObjectId::from_hex(text).with_context(|| format!("not a valid object id: {text:?}"))
}

fn cmd_init(store_root: &Path, args: InitArgs) -> anyhow::Result<ExitCode> {
    let root = args.path.as_deref().unwrap_or(store_root);
    let store = init_store(root)
        .with_context(|| format!("cannot create object store at {}", root.display()))?;
    println!(
        "{} Initialized empty object store in {}",
        "✓".green().bold(),
        store.objects_dir().display()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_hash_object(
    store_root: &Path,
    format: OutputFormat,
    args: HashObjectArgs,
) -> anyhow::Result<ExitCode> {
    let data = match &args.file {
        Some(path) if !args.stdin => std::fs::read(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        _ => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf).context("cannot read stdin")?;
            buf
        }
    };

    if args.kind == ObjectKind::Tree {
        Tree::from_payload(&data).context("content is not a valid tree")?;
    }

    let object = StoredObject::new(args.kind, data);
    let id = if args.write {
        open_store(store_root)?.write(&object)?
    } else {
        object.compute_id()
    };

    print_id(format, &id)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_cat_file(store_root: &Path, args: CatFileArgs) -> anyhow::Result<ExitCode> {
    let store = open_store(store_root)?;
    let id = parse_id(&args.object)?;

    if args.exists {
        return Ok(if store.exists(&id)? {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let object = store.read_raw(&id)?;
    let mut out = io::stdout().lock();
    if args.show_type {
        writeln!(out, "{}", object.kind())?;
    } else if args.size {
        writeln!(out, "{}", object.size())?;
    } else {
        match object.kind() {
            ObjectKind::Tree => {
                let tree = Tree::from_payload(object.data())?;
                for entry in &tree {
                    write_entry(&mut out, entry)?;
                }
            }
            ObjectKind::Blob | ObjectKind::Commit | ObjectKind::Tag => {
                out.write_all(object.data())?;
            }
        }
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

#[derive(Serialize)]
struct LsTreeRow<'a> {
    mode: EntryMode,
    #[serde(rename = "type")]
    kind: ObjectKind,
    object_id: ObjectId,
    name: Cow<'a, str>,
}

fn cmd_ls_tree(
    store_root: &Path,
    format: OutputFormat,
    args: LsTreeArgs,
) -> anyhow::Result<ExitCode> {
    let store = open_store(store_root)?;
    let id = parse_id(&args.tree)?;
    let entries = store.read_tree(&id)?;

    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Text => {
            for entry in &entries {
                if args.name_only {
                    out.write_all(&entry.name)?;
                    writeln!(out)?;
                } else {
                    write_entry(&mut out, entry)?;
                }
            }
        }
        OutputFormat::Json if args.name_only => {
            let names: Vec<Cow<'_, str>> = entries.iter().map(TreeEntry::name_lossy).collect();
            serde_json::to_writer_pretty(&mut out, &names)?;
            writeln!(out)?;
        }
        OutputFormat::Json => {
            let rows: Vec<LsTreeRow<'_>> = entries
                .iter()
                .map(|e| LsTreeRow {
                    mode: e.mode,
                    kind: e.mode.object_kind(),
                    object_id: e.object_id,
                    name: e.name_lossy(),
                })
                .collect();
            serde_json::to_writer_pretty(&mut out, &rows)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_mktree(store_root: &Path, args: MktreeArgs) -> anyhow::Result<ExitCode> {
    let store = open_store(store_root)?;
    let mut entries = Vec::new();

    for (lineno, line) in io::stdin().lock().lines().enumerate() {
        let line = line.context("cannot read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = parse_entry_line(&line).with_context(|| format!("line {}", lineno + 1))?;
        if !args.missing
            && entry.mode.object_kind() != ObjectKind::Commit
            && !store.exists(&entry.object_id)?
        {
            bail!(
                "entry {:?} references missing object {}",
                entry.name_lossy(),
                entry.object_id
            );
        }
        entries.push(entry);
    }

    let id = store.write_tree(&Tree::new(entries)?)?;
    println!("{id}");
    Ok(ExitCode::SUCCESS)
}

/// `<mode> SP <type> SP <id> TAB <name>`, the same layout `ls-tree` prints.
fn parse_entry_line(line: &str) -> anyhow::Result<TreeEntry> {
    let Some((meta, name)) = line.split_once('\t') else {
        bail!("expected '<mode> <type> <id>\\t<name>'");
    };
    let fields: Vec<&str> = meta.split_whitespace().collect();
    let [mode, kind, id] = fields.as_slice() else {
        bail!("expected three fields before the tab, got {}", fields.len());
    };
    let mode: EntryMode = mode.parse()?;
    let kind: ObjectKind = kind.parse()?;
    if kind != mode.object_kind() {
        bail!("mode {mode} refers to a {}, not a {kind}", mode.object_kind());
    }
    Ok(TreeEntry::new(mode, name, parse_id(id)?))
}

/// One `ls-tree` line. The name is written as stored, without re-encoding.
fn write_entry(out: &mut impl Write, entry: &TreeEntry) -> io::Result<()> {
    write!(
        out,
        "{} {} {}\t",
        entry.mode,
        entry.mode.object_kind(),
        entry.object_id
    )?;
    out.write_all(&entry.name)?;
    writeln!(out)
}

fn print_id(format: OutputFormat, id: &ObjectId) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{id}"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "id": id })),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_line_roundtrips_through_format() {
        let entry = TreeEntry::new(
            EntryMode::Directory,
            "src dir",
            ObjectId::from_hash([0xab; 20]),
        );
        let mut buf = Vec::new();
        write_entry(&mut buf, &entry).unwrap();
        let line = String::from_utf8(buf).unwrap();
        assert_eq!(
            line,
            "040000 tree abababababababababababababababababababab\tsrc dir\n"
        );
        assert_eq!(parse_entry_line(line.trim_end()).unwrap(), entry);
    }

    #[test]
    fn entry_line_keeps_non_utf8_name_bytes() {
        let entry = TreeEntry::new(
            EntryMode::Other(0o100664),
            b"caf\xe9".to_vec(),
            ObjectId::from_hash([0xcd; 20]),
        );
        let mut buf = Vec::new();
        write_entry(&mut buf, &entry).unwrap();
        assert!(buf.starts_with(b"100664 blob "));
        assert!(buf.ends_with(b"\tcaf\xe9\n"));
    }

    #[test]
    fn entry_line_rejects_mode_type_mismatch() {
        let line = format!("100644 tree {}\tfile", ObjectId::from_hash([1; 20]));
        assert!(parse_entry_line(&line).is_err());
    }

    #[test]
    fn entry_line_requires_tab() {
        let line = format!("100644 blob {} file", ObjectId::from_hash([1; 20]));
        assert!(parse_entry_line(&line).is_err());
    }
}
