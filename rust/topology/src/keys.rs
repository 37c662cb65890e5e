// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topology key types for arena-based storage.
//!
//! Each topology entity gets a unique, type-safe key for O(1) lookup in the
//! arena. Keys are created by `slotmap::SlotMap` and remain valid for the
//! lifetime of the arena; replaced geometry is added as new entries rather
//! than overwriting old ones, so a key always refers to the same shape.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a vertex (point in 3D space with a tolerance).
    pub struct VertexKey;

    /// Key for an edge (curve bounded by two vertices).
    pub struct EdgeKey;

    /// Key for a wire (ordered chain of connected edges).
    pub struct WireKey;
}
