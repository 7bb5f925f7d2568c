//! The chunked call splitter.
//!
//! [`split_func_call`] partitions each array input along an axis into
//! contiguous chunks of bounded size, applies a function once per aligned
//! chunk tuple in chunk order, and recombines each output position across
//! chunks. With [`SplitMode::Concat`], the recombined outputs are
//! elementwise-equal to calling the function once on the unsplit inputs.

use ndarray::{concatenate, Axis, Slice};
use tracing::debug;

use crate::array::container::ArrayContainer;
use crate::array::tensor::DeviceArray;
use crate::device::id::DeviceError;
use crate::split::chunk::{chunk_sizes, SplitMode};
use crate::split::error::SplitError;

/// A value the splitter can partition and recombine.
pub trait Splittable: Sized {
    /// Length of the given axis.
    fn axis_len(&self, axis: usize) -> Result<usize, SplitError>;

    /// Split along `axis` into contiguous parts of the given lengths.
    ///
    /// The lengths must sum to the axis length.
    fn split_axis(&self, axis: usize, sizes: &[usize]) -> Result<Vec<Self>, SplitError>;

    /// Concatenate parts along `axis`, in order.
    fn concat_axis(parts: &[Self], axis: usize) -> Result<Self, SplitError>;

    /// Elementwise sum with another value of the same shape.
    fn add(&self, other: &Self) -> Result<Self, SplitError>;

    /// Multiply every element by `factor`.
    fn scaled(&self, factor: f32) -> Self;
}

impl Splittable for DeviceArray {
    fn axis_len(&self, axis: usize) -> Result<usize, SplitError> {
        self.shape()
            .get(axis)
            .copied()
            .ok_or(SplitError::AxisOutOfBounds {
                axis,
                ndim: self.shape().len(),
            })
    }

    fn split_axis(&self, axis: usize, sizes: &[usize]) -> Result<Vec<Self>, SplitError> {
        let len = self.axis_len(axis)?;
        let total: usize = sizes.iter().sum();
        if total != len {
            return Err(SplitError::SplitLenMismatch {
                expected: len,
                got: total,
            });
        }

        let mut parts = Vec::with_capacity(sizes.len());
        let mut start = 0;
        for &size in sizes {
            let slice = self
                .data()
                .slice_axis(Axis(axis), Slice::from(start..start + size))
                .to_owned();
            parts.push(DeviceArray::on_device(slice, self.dev()));
            start += size;
        }
        Ok(parts)
    }

    fn concat_axis(parts: &[Self], axis: usize) -> Result<Self, SplitError> {
        let first = parts.first().ok_or(SplitError::NoInputs)?;
        for part in parts {
            if part.dev() != first.dev() {
                return Err(DeviceError::MixedDevices {
                    first: first.dev(),
                    other: part.dev(),
                }
                .into());
            }
        }

        let views: Vec<_> = parts.iter().map(|p| p.data().view()).collect();
        let data = concatenate(Axis(axis), &views)
            .map_err(|e| SplitError::ShapeMismatch(e.to_string()))?;
        Ok(DeviceArray::on_device(data, first.dev()))
    }

    fn add(&self, other: &Self) -> Result<Self, SplitError> {
        if self.dev() != other.dev() {
            return Err(DeviceError::MixedDevices {
                first: self.dev(),
                other: other.dev(),
            }
            .into());
        }
        if self.shape() != other.shape() {
            return Err(SplitError::ShapeMismatch(format!(
                "{:?} vs {:?}",
                self.shape(),
                other.shape()
            )));
        }
        Ok(DeviceArray::on_device(self.data() + other.data(), self.dev()))
    }

    fn scaled(&self, factor: f32) -> Self {
        DeviceArray::on_device(self.data() * factor, self.dev())
    }
}

impl Splittable for ArrayContainer {
    fn axis_len(&self, axis: usize) -> Result<usize, SplitError> {
        let mut leaves = self.iter();
        let (_, first) = leaves.next().ok_or(DeviceError::EmptyContainer)?;
        let len = first.axis_len(axis)?;
        for (_, leaf) in leaves {
            let got = leaf.axis_len(axis)?;
            if got != len {
                return Err(SplitError::SplitLenMismatch {
                    expected: len,
                    got,
                });
            }
        }
        Ok(len)
    }

    fn split_axis(&self, axis: usize, sizes: &[usize]) -> Result<Vec<Self>, SplitError> {
        if self.is_empty() {
            return Err(DeviceError::EmptyContainer.into());
        }

        let mut parts: Vec<ArrayContainer> =
            (0..sizes.len()).map(|_| ArrayContainer::new()).collect();
        for (key, leaf) in self.iter() {
            for (k, piece) in leaf.split_axis(axis, sizes)?.into_iter().enumerate() {
                parts[k].insert(key.clone(), piece);
            }
        }
        Ok(parts)
    }

    fn concat_axis(parts: &[Self], axis: usize) -> Result<Self, SplitError> {
        let first = parts.first().ok_or(SplitError::NoInputs)?;

        let mut out = ArrayContainer::new();
        for key in first.keys() {
            let mut leaves = Vec::with_capacity(parts.len());
            for part in parts {
                let leaf = part.get(key).ok_or_else(|| {
                    SplitError::ShapeMismatch(format!("key {key:?} missing from chunk result"))
                })?;
                leaves.push(leaf.clone());
            }
            out.insert(key.clone(), DeviceArray::concat_axis(&leaves, axis)?);
        }
        Ok(out)
    }

    fn add(&self, other: &Self) -> Result<Self, SplitError> {
        let mut out = ArrayContainer::new();
        for (key, leaf) in self.iter() {
            let rhs = other.get(key).ok_or_else(|| {
                SplitError::ShapeMismatch(format!("key {key:?} missing from rhs"))
            })?;
            out.insert(key.clone(), leaf.add(rhs)?);
        }
        Ok(out)
    }

    fn scaled(&self, factor: f32) -> Self {
        self.iter()
            .map(|(key, leaf)| (key.clone(), leaf.scaled(factor)))
            .collect()
    }
}

/// Split a call across chunks of the inputs.
///
/// Each input is partitioned along its axis (`input_axes` holds either
/// one shared axis or one axis per input) into contiguous chunks of at
/// most `chunk_size` elements; `f` is applied once per aligned chunk
/// tuple, in chunk order; each of `f`'s output positions is then
/// recombined across chunks according to `mode`, along `output_axes`
/// (defaulting to the input axes).
///
/// When the plan yields at most one chunk, `f` is called once on the
/// unsplit inputs.
pub fn split_func_call<T, F>(
    mut f: F,
    inputs: &[T],
    mode: SplitMode,
    chunk_size: usize,
    input_axes: &[usize],
    output_axes: Option<&[usize]>,
) -> Result<Vec<T>, SplitError>
where
    T: Splittable,
    F: FnMut(&[T]) -> Vec<T>,
{
    if inputs.is_empty() {
        return Err(SplitError::NoInputs);
    }

    let axes = resolve_axes(input_axes, inputs.len())?;

    // All inputs must agree on the length of their split axis.
    let dim = inputs[0].axis_len(axes[0])?;
    for (input, &axis) in inputs.iter().zip(&axes).skip(1) {
        let got = input.axis_len(axis)?;
        if got != dim {
            return Err(SplitError::SplitLenMismatch { expected: dim, got });
        }
    }

    let sizes = chunk_sizes(dim, chunk_size)?;
    if sizes.len() <= 1 {
        return Ok(f(inputs));
    }
    let num_chunks = sizes.len();
    debug!(dim, chunk_size, chunks = num_chunks, "Split call");

    // Partition every input, then regroup per chunk.
    let mut columns: Vec<Vec<T>> = (0..num_chunks).map(|_| Vec::new()).collect();
    for (input, &axis) in inputs.iter().zip(&axes) {
        for (k, part) in input.split_axis(axis, &sizes)?.into_iter().enumerate() {
            columns[k].push(part);
        }
    }

    // Apply `f` per chunk, checking that it returns a fixed arity.
    let mut results: Vec<Vec<T>> = Vec::with_capacity(num_chunks);
    for chunk_inputs in &columns {
        let out = f(chunk_inputs);
        if let Some(prev) = results.first() {
            if out.len() != prev.len() {
                return Err(SplitError::OutputArityMismatch {
                    expected: prev.len(),
                    got: out.len(),
                });
            }
        }
        results.push(out);
    }

    let n_out = results[0].len();
    let out_axes = resolve_output_axes(output_axes, &axes, n_out)?;

    // Regroup per output position, then recombine across chunks.
    let mut out_columns: Vec<Vec<T>> = (0..n_out).map(|_| Vec::with_capacity(num_chunks)).collect();
    for chunk_out in results {
        for (j, value) in chunk_out.into_iter().enumerate() {
            out_columns[j].push(value);
        }
    }

    let mut outputs = Vec::with_capacity(n_out);
    for (column, &axis) in out_columns.into_iter().zip(&out_axes) {
        outputs.push(combine(column, mode, axis, &sizes, dim)?);
    }
    Ok(outputs)
}

fn resolve_axes(input_axes: &[usize], n: usize) -> Result<Vec<usize>, SplitError> {
    match input_axes.len() {
        1 => Ok(vec![input_axes[0]; n]),
        len if len == n => Ok(input_axes.to_vec()),
        len => Err(SplitError::AxisCountMismatch {
            expected: n,
            got: len,
        }),
    }
}

fn resolve_output_axes(
    output_axes: Option<&[usize]>,
    input_axes: &[usize],
    n_out: usize,
) -> Result<Vec<usize>, SplitError> {
    match output_axes {
        Some(axes) if axes.len() == 1 => Ok(vec![axes[0]; n_out]),
        Some(axes) if axes.len() == n_out => Ok(axes.to_vec()),
        Some(axes) => Err(SplitError::AxisCountMismatch {
            expected: n_out,
            got: axes.len(),
        }),
        None if input_axes.len() == n_out => Ok(input_axes.to_vec()),
        None => Ok(vec![input_axes[0]; n_out]),
    }
}

fn combine<T: Splittable>(
    column: Vec<T>,
    mode: SplitMode,
    axis: usize,
    sizes: &[usize],
    dim: usize,
) -> Result<T, SplitError> {
    match mode {
        SplitMode::Concat => T::concat_axis(&column, axis),
        SplitMode::Sum => {
            let mut parts = column.into_iter();
            let mut acc = parts.next().ok_or(SplitError::NoInputs)?;
            for part in parts {
                acc = acc.add(&part)?;
            }
            Ok(acc)
        }
        SplitMode::Mean => {
            let mut parts = column.into_iter().zip(sizes);
            let (first, &first_size) = parts.next().ok_or(SplitError::NoInputs)?;
            let mut acc = first.scaled(first_size as f32 / dim as f32);
            for (part, &size) in parts {
                acc = acc.add(&part.scaled(size as f32 / dim as f32))?;
            }
            Ok(acc)
        }
    }
}
