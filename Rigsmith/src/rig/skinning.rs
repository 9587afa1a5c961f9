//! Inverse-distance skin weights.
//!
//! Each vertex is bound to its K nearest bones with weight `1 / (d + ε)`,
//! renormalized so the kept weights sum to one.

use glam::Vec3;

/// Per-vertex joint indices and weights, flattened vertex-major with
/// `influences` slots per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinWeights {
    pub joints: Vec<u8>,
    pub weights: Vec<f32>,
    pub influences: usize,
}

impl SkinWeights {
    pub fn vertex_count(&self) -> usize {
        if self.influences == 0 {
            0
        } else {
            self.joints.len() / self.influences
        }
    }

    pub fn joints_for(&self, vertex: usize) -> &[u8] {
        &self.joints[vertex * self.influences..(vertex + 1) * self.influences]
    }

    pub fn weights_for(&self, vertex: usize) -> &[f32] {
        &self.weights[vertex * self.influences..(vertex + 1) * self.influences]
    }

    /// Split the slots into VEC4 groups (`JOINTS_n` / `WEIGHTS_n`), padding
    /// the last group with joint 0 at weight 0.
    pub fn vec4_sets(&self) -> Vec<(Vec<u8>, Vec<f32>)> {
        let sets = self.influences.div_ceil(4);
        let vertices = self.vertex_count();

        (0..sets)
            .map(|set| {
                let mut joints = Vec::with_capacity(vertices * 4);
                let mut weights = Vec::with_capacity(vertices * 4);
                for v in 0..vertices {
                    for slot in set * 4..set * 4 + 4 {
                        if slot < self.influences {
                            joints.push(self.joints_for(v)[slot]);
                            weights.push(self.weights_for(v)[slot]);
                        } else {
                            joints.push(0);
                            weights.push(0.0);
                        }
                    }
                }
                (joints, weights)
            })
            .collect()
    }
}

/// Compute `max_influences` joint/weight slots for every vertex.
///
/// Ties are broken by the lower bone index. When `max_influences` exceeds the
/// bone count the extra slots hold joint 0 at weight 0. If every kept weight
/// is zero the vertex is left unnormalized.
///
/// Joint indices are stored as `u8`, so at most 256 bones are addressable.
pub fn solve(positions: &[Vec3], bones: &[Vec3], max_influences: usize, epsilon: f32) -> SkinWeights {
    let mut joints = Vec::with_capacity(positions.len() * max_influences);
    let mut weights = Vec::with_capacity(positions.len() * max_influences);
    let mut ranked: Vec<(usize, f32)> = Vec::with_capacity(bones.len());

    for &position in positions {
        ranked.clear();
        ranked.extend(
            bones
                .iter()
                .enumerate()
                .map(|(i, &bone)| (i, 1.0 / (position.distance(bone) + epsilon))),
        );
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(max_influences);

        let total: f32 = ranked.iter().map(|&(_, w)| w).sum();
        let scale = if total > 0.0 { total.recip() } else { 1.0 };

        for slot in 0..max_influences {
            match ranked.get(slot) {
                Some(&(bone, weight)) if weight * scale > 0.0 => {
                    joints.push(bone as u8);
                    weights.push(weight * scale);
                }
                _ => {
                    joints.push(0);
                    weights.push(0.0);
                }
            }
        }
    }

    SkinWeights {
        joints,
        weights,
        influences: max_influences,
    }
}
