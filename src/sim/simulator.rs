use std::collections::VecDeque;
use std::ops::Range;

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::network::{GateMode, Network, Part, PartKind};
use crate::sim::partition::{partition, split_lengths};
use crate::sim::{SimConfig, FRAMES_PER_SECOND, MAX_TIMER_DELAY};

/// Behaviour of a simulated part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Gate(GateMode),
    /// Delay line, in frames
    Timer(usize),
}

/// Delay of a timer in frames, rejecting delays above [`MAX_TIMER_DELAY`]
pub(crate) fn timer_delay(id: u32, ticks: u32, seconds: u32) -> Result<usize> {
    let delay = (seconds as usize)
        .saturating_mul(FRAMES_PER_SECOND)
        .saturating_add(ticks as usize);
    if delay > MAX_TIMER_DELAY {
        return Err(Error::TimerTooLong {
            id,
            delay,
            max: MAX_TIMER_DELAY,
        });
    }
    Ok(delay)
}

/// Frame-by-frame simulator of a part list
///
/// Each frame has two phases. The capture phase copies the state of every source of every
/// part. The commit phase then computes the new state of every part from the captured values
/// only. Both phases run over contiguous partitions of the parts, and each phase finishes on
/// every partition before the next one starts, so the result does not depend on the partitioning.
pub struct Simulator {
    cells: Vec<Cell>,
    /// Sources of part i are `sources[offsets[i]..offsets[i + 1]]`
    offsets: Vec<usize>,
    sources: Vec<u32>,
    captured: Vec<bool>,
    active: Vec<bool>,
    delay_lines: Vec<VecDeque<bool>>,
    driven: Vec<Option<bool>>,
    pinned: Vec<usize>,
    ranges: Vec<Range<usize>>,
    pool: Option<rayon::ThreadPool>,
    frame: u64,
}

/// Work of one partition during the capture phase
struct CaptureJob<'a> {
    parts: Range<usize>,
    captured: &'a mut [bool],
}

/// Work of one partition during the commit phase
struct CommitJob<'a> {
    parts: Range<usize>,
    active: &'a mut [bool],
    delay_lines: &'a mut [VecDeque<bool>],
}

impl Simulator {
    /// Build a simulator for a part list, all parts inactive
    ///
    /// Part ids must be their positions in the list, and every incoming connection must refer
    /// to an existing part.
    pub fn new<P>(parts: &[Part<P>], config: &SimConfig) -> Result<Simulator> {
        let nb_parts = parts.len();
        let mut cells = Vec::with_capacity(nb_parts);
        let mut offsets = Vec::with_capacity(nb_parts + 1);
        let mut sources = Vec::new();
        let mut delay_lines = Vec::with_capacity(nb_parts);
        let mut pinned = Vec::new();
        offsets.push(0);
        for (i, p) in parts.iter().enumerate() {
            if p.id as usize != i {
                return Err(Error::MisplacedPart {
                    id: p.id,
                    position: i,
                });
            }
            for &s in &p.connections_from {
                if s as usize >= nb_parts {
                    return Err(Error::UnknownPart { id: s });
                }
                sources.push(s);
            }
            offsets.push(sources.len());
            let cell = match p.kind {
                PartKind::Gate { mode } => Cell::Gate(mode),
                PartKind::Timer { ticks, seconds } => {
                    Cell::Timer(timer_delay(p.id, ticks, seconds)?)
                }
            };
            delay_lines.push(match cell {
                Cell::Timer(delay) => VecDeque::from(vec![false; delay]),
                Cell::Gate(_) => VecDeque::new(),
            });
            cells.push(cell);
            if p.pinned {
                pinned.push(i);
            }
        }

        let ranges = partition(nb_parts, config.partitions);
        let pool = match config.threads {
            Some(n) if ranges.len() > 1 => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("sim-{}", i))
                    .build()?,
            ),
            _ => None,
        };
        debug!(
            "Simulating {} parts with {} connections over {} partitions",
            nb_parts,
            sources.len(),
            ranges.len()
        );

        Ok(Simulator {
            cells,
            captured: vec![false; sources.len()],
            offsets,
            sources,
            active: vec![false; nb_parts],
            delay_lines,
            driven: vec![None; nb_parts],
            pinned,
            ranges,
            pool,
            frame: 0,
        })
    }

    /// Build a simulator for a compiled network
    pub fn from_network<P: Clone>(network: &Network<P>, config: &SimConfig) -> Result<Simulator> {
        Simulator::new(&network.parts()?, config)
    }

    /// Number of simulated parts
    pub fn nb_parts(&self) -> usize {
        self.cells.len()
    }

    /// Number of frames simulated so far
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Whether a part is active, or `None` if there is no such part
    pub fn is_active(&self, id: u32) -> Option<bool> {
        self.active.get(id as usize).copied()
    }

    /// States of all parts, ordered by id
    pub fn states(&self) -> &[bool] {
        &self.active
    }

    /// Ids of the pinned parts
    pub fn pinned(&self) -> impl Iterator<Item = u32> + '_ {
        self.pinned.iter().map(|i| *i as u32)
    }

    /// States of the pinned parts, ordered by id
    pub fn pinned_states(&self) -> Vec<bool> {
        self.pinned.iter().map(|i| self.active[*i]).collect()
    }

    /// Force the state of a part, or release it with `None`
    ///
    /// A driven part commits the driven value instead of evaluating its inputs, starting with the
    /// next frame.
    pub fn drive(&mut self, id: u32, value: Option<bool>) -> Result<()> {
        let d = self
            .driven
            .get_mut(id as usize)
            .ok_or(Error::UnknownPart { id })?;
        *d = value;
        Ok(())
    }

    /// Simulate one frame
    pub fn step(&mut self) {
        self.capture();
        self.commit();
        self.frame += 1;
        trace!("Frame {} simulated", self.frame);
    }

    /// Simulate several frames
    pub fn run(&mut self, frames: usize) {
        for _ in 0..frames {
            self.step();
        }
    }

    /// Run the jobs on the partitions, returning once all are done
    fn dispatch<J: Send>(
        pool: Option<&rayon::ThreadPool>,
        jobs: Vec<J>,
        f: impl Fn(J) + Sync + Send,
    ) {
        if jobs.len() <= 1 {
            jobs.into_iter().for_each(f);
        } else if let Some(pool) = pool {
            pool.install(|| jobs.into_par_iter().for_each(f));
        } else {
            jobs.into_par_iter().for_each(f);
        }
    }

    /// Snapshot the state of the sources of every part
    fn capture(&mut self) {
        let offsets = &self.offsets;
        let sources = &self.sources;
        let active = &self.active;
        let lengths = self
            .ranges
            .iter()
            .map(|r| offsets[r.end] - offsets[r.start]);
        let jobs = split_lengths(&mut self.captured, lengths)
            .into_iter()
            .zip(self.ranges.iter())
            .map(|(captured, r)| CaptureJob {
                parts: r.clone(),
                captured,
            })
            .collect::<Vec<_>>();
        Simulator::dispatch(self.pool.as_ref(), jobs, |job| {
            let base = offsets[job.parts.start];
            for k in offsets[job.parts.start]..offsets[job.parts.end] {
                job.captured[k - base] = active[sources[k] as usize];
            }
        });
    }

    /// Compute the new state of every part from the captured values
    fn commit(&mut self) {
        let offsets = &self.offsets;
        let cells = &self.cells;
        let captured = &self.captured;
        let driven = &self.driven;
        let lengths = self.ranges.iter().map(|r| r.len()).collect::<Vec<_>>();
        let jobs = split_lengths(&mut self.active, lengths.iter().copied())
            .into_iter()
            .zip(split_lengths(&mut self.delay_lines, lengths.iter().copied()))
            .zip(self.ranges.iter())
            .map(|((active, delay_lines), r)| CommitJob {
                parts: r.clone(),
                active,
                delay_lines,
            })
            .collect::<Vec<_>>();
        Simulator::dispatch(self.pool.as_ref(), jobs, |job| {
            for (j, i) in job.parts.clone().enumerate() {
                let inputs = &captured[offsets[i]..offsets[i + 1]];
                let next = match cells[i] {
                    Cell::Gate(mode) => mode.evaluate(inputs),
                    Cell::Timer(_) => {
                        let line = &mut job.delay_lines[j];
                        line.push_back(inputs.iter().any(|b| *b));
                        line.pop_front().unwrap_or(false)
                    }
                };
                job.active[j] = driven[i].unwrap_or(next);
            }
        });
    }
}
