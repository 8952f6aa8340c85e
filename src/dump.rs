// src/dump.rs
//
// Line-oriented text dumps of the learned tables.
//
// Contract:
// - value / trace dumps: one line per state, the state tuple followed by
//   arrow-separated `(unit, zone)=value` entries;
// - policy dump: one line per state, `state -> (unit, zone)`.
//
// Lines are sorted by state tuple and entries by action, so identical
// tables produce byte-identical dumps.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::mdp::{DispatchAction, MdpState};
use crate::policy::{PairKey, StatePolicy, TraceTable, ValueTable};

/// Write a value dump: `state -> (unit, zone)=value -> ...` per line.
pub fn write_value_dump<W: Write>(w: &mut W, values: &ValueTable) -> io::Result<()> {
    write_pair_table(w, values.iter())
}

/// Write a trace / visit-weight dump, same shape as the value dump.
pub fn write_trace_dump<W: Write>(w: &mut W, traces: &TraceTable) -> io::Result<()> {
    write_pair_table(w, traces.iter())
}

/// Write a policy dump: `state -> (unit, zone)` per line.
pub fn write_policy_dump<W: Write>(w: &mut W, policy: &StatePolicy) -> io::Result<()> {
    let mut rows: Vec<(&MdpState, &DispatchAction)> = policy.iter().collect();
    rows.sort();
    for (state, action) in rows {
        writeln!(w, "{state} -> {action}")?;
    }
    Ok(())
}

pub fn dump_value_table<P: AsRef<Path>>(path: P, values: &ValueTable) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_value_dump(&mut w, values)?;
    w.flush()
}

pub fn dump_trace_table<P: AsRef<Path>>(path: P, traces: &TraceTable) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_trace_dump(&mut w, traces)?;
    w.flush()
}

pub fn dump_policy<P: AsRef<Path>>(path: P, policy: &StatePolicy) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_policy_dump(&mut w, policy)?;
    w.flush()
}

fn write_pair_table<'a, W, I>(w: &mut W, entries: I) -> io::Result<()>
where
    W: Write,
    I: Iterator<Item = (&'a PairKey, &'a f64)>,
{
    let mut rows: Vec<(&PairKey, f64)> = entries.map(|(k, v)| (k, *v)).collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));

    let mut current: Option<&MdpState> = None;
    for (key, value) in rows {
        let (state, action) = (&key.0, &key.1);
        if current != Some(state) {
            if current.is_some() {
                writeln!(w)?;
            }
            write!(w, "{state}")?;
            current = Some(state);
        }
        write!(w, " -> {action}={value:.4}")?;
    }
    if current.is_some() {
        writeln!(w)?;
    }
    Ok(())
}
