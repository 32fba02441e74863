use bevy::{math::Rect, prelude::Resource};
use enum_map::EnumMap;
use glam::{IVec2, UVec2, Vec2, Vec3};
use pf_core::projection::ToFlat;

use crate::unit::{InfluenceUnit, Team, MAX_STRENGTH};

/// A grid of signed influence weights covering a rectangle of the ground
/// plane. Positive weights mean [`Team::Green`] dominance, negative weights
/// mean [`Team::Red`] dominance.
///
/// The grid X axis is aligned with world X axis, grid Y axis with world Z
/// axis.
#[derive(Resource, Clone, Debug)]
pub struct InfluenceMap {
    area: Rect,
    dimensions: UVec2,
    cell_size: Vec2,
    weights: Vec<i32>,
}

impl InfluenceMap {
    /// Builds a new influence map.
    ///
    /// Each unit adds influence to every cell within `strength - 1` cells
    /// (along both axes) from the cell it is in. The added influence is
    /// strength minus Manhattan distance of the cells, it is never negative
    /// and never larger than [`MAX_STRENGTH`]. Units outside of the area
    /// still influence cells inside of it.
    ///
    /// # Arguments
    ///
    /// * `area` - covered rectangle. X and Z world coordinates correspond to
    ///   the rectangle X and Y coordinates.
    ///
    /// * `columns` - number of cells along X axis. Zero is replaced by 1.
    ///
    /// * `rows` - number of cells along Z axis. Zero is replaced by 1.
    ///
    /// * `units` - positions and parameters of all influencing units.
    pub fn build<I>(area: Rect, columns: u16, rows: u16, units: I) -> Self
    where
        I: IntoIterator<Item = (Vec3, InfluenceUnit)>,
    {
        let dimensions = UVec2::new(columns.max(1) as u32, rows.max(1) as u32);
        let mut map = Self {
            area,
            dimensions,
            cell_size: area.size() / dimensions.as_vec2(),
            weights: vec![0; (dimensions.x * dimensions.y) as usize],
        };

        for (position, unit) in units {
            map.add_unit(position, unit);
        }
        map
    }

    fn add_unit(&mut self, position: Vec3, unit: InfluenceUnit) {
        let center = self.raw_cell(position);
        let (center_x, center_y) = (center.x as i64, center.y as i64);
        let strength = unit.strength() as i64;
        let reach = strength - 1;
        let sign = unit.team().sign();

        // Far away units have saturated cells, i64 bounds never overflow.
        let min_x = (center_x - reach).max(0);
        let max_x = (center_x + reach).min(self.dimensions.x as i64 - 1);
        let min_y = (center_y - reach).max(0);
        let max_y = (center_y + reach).min(self.dimensions.y as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let distance = (x - center_x).abs() + (y - center_y).abs();
                let influence = (strength - distance).clamp(0, MAX_STRENGTH as i64) as i32;
                let index = y as usize * self.dimensions.x as usize + x as usize;
                self.weights[index] += influence * sign;
            }
        }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// Number of columns (X) and rows (Y) of the grid.
    pub fn dimensions(&self) -> UVec2 {
        self.dimensions
    }

    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Returns the grid cell containing a world position or None if the
    /// position lies outside of the covered area.
    pub fn cell_of(&self, position: Vec3) -> Option<UVec2> {
        let cell = self.raw_cell(position);
        self.index(cell).map(|_| cell.as_uvec2())
    }

    /// Returns the summed influence of a cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of the grid.
    pub fn weight(&self, cell: UVec2) -> i32 {
        match self.index(cell.as_ivec2()) {
            Some(index) => self.weights[index],
            None => panic!(
                "Cell {:?} is out of the grid {:?}",
                cell, self.dimensions
            ),
        }
    }

    /// Returns weight of a cell relative to the maximum influence of a
    /// single unit: 1 means a full strength green unit, -1 a full strength
    /// red unit. The result is not clamped.
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of the grid.
    pub fn balance(&self, cell: UVec2) -> f32 {
        self.weight(cell) as f32 / MAX_STRENGTH as f32
    }

    /// Returns world position (at zero altitude) of the center of a cell.
    pub fn cell_center(&self, cell: UVec2) -> Vec3 {
        let center = self.area.min + self.cell_size * (cell.as_vec2() + 0.5);
        Vec3::new(center.x, 0., center.y)
    }

    /// Returns number of cells dominated by each team.
    pub fn control(&self) -> EnumMap<Team, usize> {
        let mut control = EnumMap::default();
        for &weight in &self.weights {
            if weight > 0 {
                control[Team::Green] += 1;
            } else if weight < 0 {
                control[Team::Red] += 1;
            }
        }
        control
    }

    /// Cell of a position without bounds checking.
    fn raw_cell(&self, position: Vec3) -> IVec2 {
        ((position.to_flat() - self.area.min) / self.cell_size)
            .floor()
            .as_ivec2()
    }

    fn index(&self, cell: IVec2) -> Option<usize> {
        if cell.x < 0
            || cell.y < 0
            || cell.x >= self.dimensions.x as i32
            || cell.y >= self.dimensions.y as i32
        {
            None
        } else {
            Some(cell.y as usize * self.dimensions.x as usize + cell.x as usize)
        }
    }
}
