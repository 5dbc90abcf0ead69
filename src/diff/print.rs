use crate::diff::DiffOptions;
use crate::error::Result;
use crate::graph::CommitGraphView;
use crate::store::ObjectStore;
use crate::types::{
    DeltaStatus, DiffDelta, DiffFile, DiffHunk, DiffLine, LineOrigin, ObjectKind,
};

/// output format for diff rendering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiffFormat {
    /// one path per delta
    NameOnly,
    /// status letter and path(s) per delta
    NameStatus,
    /// mode/id/status raw rows
    Raw,
    /// patch headers without hunk content
    PatchHeader,
    /// full unified patch
    Patch,
}

/// render deltas through a per-line callback
///
/// the callback receives each line exactly once, with hunk context for
/// patch content; line buffers are borrowed and never retained past the
/// call, so rendering large diffs stays bounded. hunks come from a Myers
/// line diff over blob contents with `opts.context_lines` of context; the
/// whitespace/line-ending flags apply here and only here.
///
/// `Unmodified`, `Ignored` and `Untracked` deltas are skipped by the patch
/// formats (they carry no renderable content pair).
pub fn print<'a, S, F>(
    view: &CommitGraphView<'a, S>,
    deltas: &[DiffDelta],
    format: DiffFormat,
    opts: &DiffOptions,
    mut callback: F,
) -> Result<()>
where
    S: ObjectStore,
    F: FnMut(&DiffDelta, Option<&DiffHunk>, &DiffLine<'_>) -> Result<()>,
{
    for delta in deltas {
        match format {
            DiffFormat::NameOnly => {
                let text = format!("{}\n", delta.path());
                callback(
                    delta,
                    None,
                    &DiffLine::header(text.as_bytes(), LineOrigin::FileHeader),
                )?;
            }
            DiffFormat::NameStatus => {
                let text = name_status_row(delta);
                callback(
                    delta,
                    None,
                    &DiffLine::header(text.as_bytes(), LineOrigin::FileHeader),
                )?;
            }
            DiffFormat::Raw => {
                let text = raw_row(delta);
                callback(
                    delta,
                    None,
                    &DiffLine::header(text.as_bytes(), LineOrigin::FileHeader),
                )?;
            }
            DiffFormat::PatchHeader => {
                if patch_relevant(delta) {
                    emit_file_header(delta, &mut callback)?;
                }
            }
            DiffFormat::Patch => {
                if patch_relevant(delta) {
                    emit_file_header(delta, &mut callback)?;
                    emit_hunks(view, delta, opts, &mut callback)?;
                }
            }
        }
    }
    Ok(())
}

fn patch_relevant(delta: &DiffDelta) -> bool {
    !matches!(
        delta.status,
        DeltaStatus::Unmodified | DeltaStatus::Ignored | DeltaStatus::Untracked
    )
}

fn name_status_row(delta: &DiffDelta) -> String {
    match delta.status {
        DeltaStatus::Renamed | DeltaStatus::Copied => format!(
            "{}{}\t{}\t{}\n",
            delta.status,
            delta.similarity.unwrap_or(0),
            delta.old_path().unwrap_or(""),
            delta.new_path().unwrap_or(""),
        ),
        _ => format!("{}\t{}\n", delta.status, delta.path()),
    }
}

fn raw_row(delta: &DiffDelta) -> String {
    let (old_mode, old_id) = delta
        .old
        .as_ref()
        .map(|f| (f.mode.as_octal(), f.id.short_hex()))
        .unwrap_or(("000000", "0".repeat(12)));
    let (new_mode, new_id) = delta
        .new
        .as_ref()
        .map(|f| (f.mode.as_octal(), f.id.short_hex()))
        .unwrap_or(("000000", "0".repeat(12)));

    match delta.status {
        DeltaStatus::Renamed | DeltaStatus::Copied => format!(
            ":{} {} {} {} {}{}\t{}\t{}\n",
            old_mode,
            new_mode,
            old_id,
            new_id,
            delta.status,
            delta.similarity.unwrap_or(0),
            delta.old_path().unwrap_or(""),
            delta.new_path().unwrap_or(""),
        ),
        _ => format!(
            ":{} {} {} {} {}\t{}\n",
            old_mode,
            new_mode,
            old_id,
            new_id,
            delta.status,
            delta.path(),
        ),
    }
}

fn emit_file_header<F>(delta: &DiffDelta, callback: &mut F) -> Result<()>
where
    F: FnMut(&DiffDelta, Option<&DiffHunk>, &DiffLine<'_>) -> Result<()>,
{
    let mut emit = |text: String| {
        callback(
            delta,
            None,
            &DiffLine::header(text.as_bytes(), LineOrigin::FileHeader),
        )
    };

    let old_path = delta.old_path().unwrap_or_else(|| delta.path());
    let new_path = delta.new_path().unwrap_or_else(|| delta.path());
    emit(format!("diff --git a/{} b/{}\n", old_path, new_path))?;

    match delta.status {
        DeltaStatus::Added => {
            if let Some(new) = &delta.new {
                emit(format!("new file mode {}\n", new.mode.as_octal()))?;
            }
        }
        DeltaStatus::Deleted => {
            if let Some(old) = &delta.old {
                emit(format!("deleted file mode {}\n", old.mode.as_octal()))?;
            }
        }
        DeltaStatus::Renamed => {
            emit(format!(
                "similarity index {}%\n",
                delta.similarity.unwrap_or(0)
            ))?;
            emit(format!("rename from {}\n", old_path))?;
            emit(format!("rename to {}\n", new_path))?;
        }
        DeltaStatus::Copied => {
            emit(format!(
                "similarity index {}%\n",
                delta.similarity.unwrap_or(0)
            ))?;
            emit(format!("copy from {}\n", old_path))?;
            emit(format!("copy to {}\n", new_path))?;
        }
        _ => {
            if let (Some(old), Some(new)) = (&delta.old, &delta.new) {
                if old.mode != new.mode {
                    emit(format!("old mode {}\n", old.mode.as_octal()))?;
                    emit(format!("new mode {}\n", new.mode.as_octal()))?;
                }
            }
        }
    }

    let old_id = delta.old.as_ref().map(|f| f.id);
    let new_id = delta.new.as_ref().map(|f| f.id);
    if old_id != new_id {
        let old_hex = old_id.map(|id| id.short_hex()).unwrap_or("0".repeat(12));
        let new_hex = new_id.map(|id| id.short_hex()).unwrap_or("0".repeat(12));
        emit(format!("index {}..{}\n", old_hex, new_hex))?;

        match delta.old.as_ref() {
            Some(old) => emit(format!("--- a/{}\n", old.path))?,
            None => emit("--- /dev/null\n".to_string())?,
        }
        match delta.new.as_ref() {
            Some(new) => emit(format!("+++ b/{}\n", new.path))?,
            None => emit("+++ /dev/null\n".to_string())?,
        }
    }
    Ok(())
}

/// side content eligible for line diffing: present and blob-backed
fn blob_side<'d>(file: &'d Option<DiffFile>) -> Option<&'d DiffFile> {
    file.as_ref()
        .filter(|f| f.mode.target_kind() == ObjectKind::Blob)
}

fn emit_hunks<'a, S, F>(
    view: &CommitGraphView<'a, S>,
    delta: &DiffDelta,
    opts: &DiffOptions,
    callback: &mut F,
) -> Result<()>
where
    S: ObjectStore,
    F: FnMut(&DiffDelta, Option<&DiffHunk>, &DiffLine<'_>) -> Result<()>,
{
    let old_content: &[u8] = match blob_side(&delta.old) {
        Some(f) => view.blob_ref(f.id)?.content.as_slice(),
        None => &[],
    };
    let new_content: &[u8] = match blob_side(&delta.new) {
        Some(f) => view.blob_ref(f.id)?.content.as_slice(),
        None => &[],
    };

    let old_lines = split_lines(old_content);
    let new_lines = split_lines(new_content);
    let old_ends_nl = old_content.is_empty() || old_content.ends_with(b"\n");
    let new_ends_nl = new_content.is_empty() || new_content.ends_with(b"\n");

    let ops = myers_ops(&old_lines, &new_lines, |a, b| lines_equal(a, b, opts));
    let ranges = plan_hunks(&ops, opts.context_lines as usize);
    if ranges.is_empty() {
        return Ok(());
    }

    // running 0-based line counters at each op index
    let mut positions = Vec::with_capacity(ops.len() + 1);
    let (mut op_old, mut op_new) = (0u32, 0u32);
    for op in &ops {
        positions.push((op_old, op_new));
        match op {
            Op::Equal(_, _) => {
                op_old += 1;
                op_new += 1;
            }
            Op::Delete(_) => op_old += 1,
            Op::Insert(_) => op_new += 1,
        }
    }
    positions.push((op_old, op_new));

    for (start, end) in ranges {
        let (old_pos, new_pos) = positions[start];
        let old_count = ops[start..end]
            .iter()
            .filter(|op| matches!(op, Op::Equal(_, _) | Op::Delete(_)))
            .count() as u32;
        let new_count = ops[start..end]
            .iter()
            .filter(|op| matches!(op, Op::Equal(_, _) | Op::Insert(_)))
            .count() as u32;

        let old_start = if old_count == 0 { old_pos } else { old_pos + 1 };
        let new_start = if new_count == 0 { new_pos } else { new_pos + 1 };
        let hunk = DiffHunk {
            old_start,
            old_lines: old_count,
            new_start,
            new_lines: new_count,
            header: format!(
                "@@ -{},{} +{},{} @@",
                old_start, old_count, new_start, new_count
            ),
        };

        let header_text = format!("{}\n", hunk.header);
        callback(
            delta,
            Some(&hunk),
            &DiffLine::header(header_text.as_bytes(), LineOrigin::HunkHeader),
        )?;

        for op in &ops[start..end] {
            let (origin, content, old_lineno, new_lineno) = match op {
                Op::Equal(oi, ni) => (
                    LineOrigin::Context,
                    new_lines[*ni],
                    Some(*oi as u32 + 1),
                    Some(*ni as u32 + 1),
                ),
                Op::Delete(oi) => (LineOrigin::Deletion, old_lines[*oi], Some(*oi as u32 + 1), None),
                Op::Insert(ni) => (LineOrigin::Addition, new_lines[*ni], None, Some(*ni as u32 + 1)),
            };
            callback(
                delta,
                Some(&hunk),
                &DiffLine {
                    origin,
                    content,
                    old_lineno,
                    new_lineno,
                },
            )?;

            let missing_nl = match op {
                Op::Equal(_, ni) => !new_ends_nl && *ni + 1 == new_lines.len(),
                Op::Delete(oi) => !old_ends_nl && *oi + 1 == old_lines.len(),
                Op::Insert(ni) => !new_ends_nl && *ni + 1 == new_lines.len(),
            };
            if missing_nl {
                callback(
                    delta,
                    Some(&hunk),
                    &DiffLine::header(
                        b"\\ No newline at end of file\n",
                        LineOrigin::EofNoNewline,
                    ),
                )?;
            }
        }
    }
    Ok(())
}

/// split into lines, each slice keeping its trailing newline
fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, b) in content.iter().enumerate() {
        if *b == b'\n' {
            lines.push(&content[start..=i]);
            start = i + 1;
        }
    }
    if start < content.len() {
        lines.push(&content[start..]);
    }
    lines
}

fn lines_equal(a: &[u8], b: &[u8], opts: &DiffOptions) -> bool {
    if !opts.ignore_whitespace && !opts.ignore_line_endings {
        return a == b;
    }
    let normalize = |line: &[u8]| -> Vec<u8> {
        let mut line = line;
        if opts.ignore_line_endings {
            if let Some(stripped) = line.strip_suffix(b"\n") {
                line = stripped;
            }
            if let Some(stripped) = line.strip_suffix(b"\r") {
                line = stripped;
            }
        }
        if opts.ignore_whitespace {
            line.iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect()
        } else {
            line.to_vec()
        }
    };
    normalize(a) == normalize(b)
}

/// one edit-script step; indices are 0-based line numbers per side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Op {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// shortest edit script between two line lists (Myers, forward with trace)
fn myers_ops(old: &[&[u8]], new: &[&[u8]], eq: impl Fn(&[u8], &[u8]) -> bool) -> Vec<Op> {
    let n = old.len() as isize;
    let m = new.len() as isize;
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let offset = max;
    let width = (2 * max + 1) as usize;
    let mut v = vec![0isize; width];
    let mut trace: Vec<Vec<isize>> = Vec::new();

    'search: for d in 0..=max {
        trace.push(v.clone());
        let mut k = -d;
        while k <= d {
            let idx = (k + offset) as usize;
            let mut x = if k == -d || (k != d && v[idx - 1] < v[idx + 1]) {
                v[idx + 1]
            } else {
                v[idx - 1] + 1
            };
            let mut y = x - k;
            while x < n && y < m && eq(old[x as usize], new[y as usize]) {
                x += 1;
                y += 1;
            }
            v[idx] = x;
            if x >= n && y >= m {
                break 'search;
            }
            k += 2;
        }
    }

    let mut ops = Vec::new();
    let mut x = n;
    let mut y = m;
    for (d, v) in trace.iter().enumerate().rev() {
        let d = d as isize;
        let k = x - y;
        let prev_k = if k == -d
            || (k != d && v[(k - 1 + offset) as usize] < v[(k + 1 + offset) as usize])
        {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + offset) as usize];
        let prev_y = prev_x - prev_k;

        while x > prev_x && y > prev_y {
            ops.push(Op::Equal((x - 1) as usize, (y - 1) as usize));
            x -= 1;
            y -= 1;
        }
        if d > 0 {
            if x == prev_x {
                ops.push(Op::Insert((y - 1) as usize));
                y -= 1;
            } else {
                ops.push(Op::Delete((x - 1) as usize));
                x -= 1;
            }
        }
    }
    ops.reverse();
    ops
}

/// group changed ops into context-padded, merged hunk ranges
fn plan_hunks(ops: &[Op], context: usize) -> Vec<(usize, usize)> {
    let changed: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| !matches!(op, Op::Equal(_, _)))
        .map(|(i, _)| i)
        .collect();
    if changed.is_empty() {
        return Vec::new();
    }

    let mut ranges = Vec::new();
    let mut cur_start = changed[0].saturating_sub(context);
    let mut cur_end = changed[0] + 1 + context;
    for &c in &changed[1..] {
        let start = c.saturating_sub(context);
        if start <= cur_end {
            cur_end = c + 1 + context;
        } else {
            ranges.push((cur_start, cur_end.min(ops.len())));
            cur_start = start;
            cur_end = c + 1 + context;
        }
    }
    ranges.push((cur_start, cur_end.min(ops.len())));
    ranges
}
