// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use penstock_core::utils::index::{TypedIndex, TypedIndexTag};

/// A tag type for pump slots in the decision vector.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PumpIndexTag;

impl TypedIndexTag for PumpIndexTag {
    const NAME: &'static str = "PumpIndex";
}

/// A typed index for pump slots.
pub type PumpIndex = TypedIndex<PumpIndexTag>;

/// A tag type for tank slots in the level checks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TankIndexTag;

impl TypedIndexTag for TankIndexTag {
    const NAME: &'static str = "TankIndex";
}

/// A typed index for tank slots.
pub type TankIndex = TypedIndex<TankIndexTag>;

/// A tag type for monitor-node slots in the pressure checks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct MonitorIndexTag;

impl TypedIndexTag for MonitorIndexTag {
    const NAME: &'static str = "MonitorIndex";
}

/// A typed index for monitor-node slots.
pub type MonitorIndex = TypedIndex<MonitorIndexTag>;

/// A tag type for node handles issued by a hydraulic engine.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeHandleTag;

impl TypedIndexTag for NodeHandleTag {
    const NAME: &'static str = "NodeHandle";
}

/// An opaque handle to a node inside a hydraulic engine.
pub type NodeHandle = TypedIndex<NodeHandleTag>;

/// A tag type for link handles issued by a hydraulic engine.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LinkHandleTag;

impl TypedIndexTag for LinkHandleTag {
    const NAME: &'static str = "LinkHandle";
}

/// An opaque handle to a link (pump, pipe, valve) inside a hydraulic engine.
pub type LinkHandle = TypedIndex<LinkHandleTag>;

/// A tag type for pattern handles issued by a hydraulic engine.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PatternHandleTag;

impl TypedIndexTag for PatternHandleTag {
    const NAME: &'static str = "PatternHandle";
}

/// An opaque handle to a time pattern inside a hydraulic engine.
pub type PatternHandle = TypedIndex<PatternHandleTag>;
