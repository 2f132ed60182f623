// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/hough.rs - 概率霍夫直线检测与车道线屏障重建
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::{GrayImage, Luma};
use imageproc::point::Point;
use tracing::debug;

use crate::lane::{
  morphology::{StructuringElement, dilate},
  params::HoughParams,
  stroke::draw_thick_line_mut,
};

/// 线段描边的前景值
pub const LINE_VALUE: u8 = 255;

// 定点数步进的小数位数
const FIXED_SHIFT: u32 = 16;
// 访问顺序随机数的固定种子，保证同一帧结果一致
const RNG_SEED: u64 = u64::MAX;
const RNG_COEFF: u64 = 4_164_903_690;

/// 线段膨胀用的固定结构元素
pub fn line_dilate_element() -> StructuringElement {
  StructuringElement::rect(4, 4)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
  pub start: Point<i32>,
  pub end: Point<i32>,
}

impl LineSegment {
  pub fn new(start: Point<i32>, end: Point<i32>) -> Self {
    Self { start, end }
  }

  /// x、y 方向跨度中较大的一个
  pub fn span(&self) -> i32 {
    (self.end.x - self.start.x)
      .abs()
      .max((self.end.y - self.start.y).abs())
  }
}

// 乘-进位随机数发生器
struct MwcRng(u64);

impl MwcRng {
  fn next_u32(&mut self) -> u32 {
    self.0 = (self.0 as u32 as u64)
      .wrapping_mul(RNG_COEFF)
      .wrapping_add(self.0 >> 32);
    self.0 as u32
  }

  fn below(&mut self, n: usize) -> usize {
    self.next_u32() as usize % n
  }
}

struct Accumulator {
  trig: Vec<(f32, f32)>,
  num_rho: usize,
  votes: Vec<i32>,
}

impl Accumulator {
  fn new(width: u32, height: u32, params: &HoughParams) -> Self {
    let irho = 1.0 / params.rho;
    let num_angle = ((std::f32::consts::PI / params.theta).round() as usize).max(1);
    let num_rho = ((((width + height) * 2 + 1) as f32 / params.rho).round() as usize).max(1);
    let trig = (0..num_angle)
      .map(|n| {
        let angle = n as f64 * params.theta as f64;
        ((angle.cos() * irho as f64) as f32, (angle.sin() * irho as f64) as f32)
      })
      .collect();

    Self {
      trig,
      num_rho,
      votes: vec![0; num_angle * num_rho],
    }
  }

  fn bin(&self, n: usize, x: i64, y: i64) -> usize {
    let (cos, sin) = self.trig[n];
    let r = (x as f32 * cos + y as f32 * sin).round() as i64 + (self.num_rho as i64 - 1) / 2;
    n * self.num_rho + r.clamp(0, self.num_rho as i64 - 1) as usize
  }

  /// 为点投票，返回票数最高的角度序号及其票数
  fn vote(&mut self, x: i64, y: i64) -> (usize, i32) {
    let mut best = (0, i32::MIN);
    for n in 0..self.trig.len() {
      let bin = self.bin(n, x, y);
      self.votes[bin] += 1;
      if self.votes[bin] > best.1 {
        best = (n, self.votes[bin]);
      }
    }
    best
  }

  fn unvote(&mut self, x: i64, y: i64) {
    for n in 0..self.trig.len() {
      let bin = self.bin(n, x, y);
      self.votes[bin] -= 1;
    }
  }
}

// 沿直线的定点数步进
#[derive(Clone, Copy)]
struct Walker {
  x: i64,
  y: i64,
  dx: i64,
  dy: i64,
  x_major: bool,
}

impl Walker {
  fn new(x: i64, y: i64, a: f32, b: f32) -> Self {
    let half = 1i64 << (FIXED_SHIFT - 1);
    if a.abs() > b.abs() {
      Self {
        x,
        y: (y << FIXED_SHIFT) + half,
        dx: if a > 0.0 { 1 } else { -1 },
        dy: ((b as f64 * (1i64 << FIXED_SHIFT) as f64) / a.abs() as f64).round() as i64,
        x_major: true,
      }
    } else {
      Self {
        x: (x << FIXED_SHIFT) + half,
        y,
        dx: ((a as f64 * (1i64 << FIXED_SHIFT) as f64) / b.abs() as f64).round() as i64,
        dy: if b > 0.0 { 1 } else { -1 },
        x_major: false,
      }
    }
  }

  fn reversed(self) -> Self {
    Self {
      dx: -self.dx,
      dy: -self.dy,
      ..self
    }
  }

  fn pixel(&self) -> (i64, i64) {
    if self.x_major {
      (self.x, self.y >> FIXED_SHIFT)
    } else {
      (self.x >> FIXED_SHIFT, self.y)
    }
  }

  fn step(&mut self) {
    self.x += self.dx;
    self.y += self.dy;
  }
}

/// 渐进式概率霍夫变换，返回边缘图上的直线段
///
/// 非零像素按固定种子的随机顺序逐个投票；票数达到阈值后沿该方向
/// 双向行走，容忍不超过 `max_line_gap` 的空隙，得到的线段长度达到
/// `min_line_length` 时输出，并撤销线段上像素的投票。
pub fn detect_segments(edges: &GrayImage, params: &HoughParams) -> Vec<LineSegment> {
  let (width, height) = edges.dimensions();
  let (w, h) = (width as i64, height as i64);
  let threshold = params.threshold as i32;
  let max_gap = params.max_line_gap as i64;
  let min_length = params.min_line_length as i64;

  let mut mask: Vec<bool> = edges.as_raw().iter().map(|&v| v != 0).collect();
  let mut points: Vec<(i64, i64)> = edges
    .enumerate_pixels()
    .filter(|(_, _, p)| p[0] != 0)
    .map(|(x, y, _)| (x as i64, y as i64))
    .collect();

  let mut accumulator = Accumulator::new(width, height, params);
  let mut rng = MwcRng(RNG_SEED);
  let mut segments = Vec::new();
  let index = |x: i64, y: i64| (y * w + x) as usize;

  for count in (1..=points.len()).rev() {
    let picked = rng.below(count);
    let (x, y) = points[picked];
    points[picked] = points[count - 1];

    // 已被其他线段占用
    if !mask[index(x, y)] {
      continue;
    }

    let (best_angle, best_votes) = accumulator.vote(x, y);
    if best_votes < threshold {
      continue;
    }

    let (cos, sin) = accumulator.trig[best_angle];
    let origin = Walker::new(x, y, -sin, cos);

    let mut ends = [(x, y); 2];
    for (k, end) in ends.iter_mut().enumerate() {
      let mut walker = if k == 0 { origin } else { origin.reversed() };
      let mut gap = 0;
      loop {
        let (px, py) = walker.pixel();
        if px < 0 || px >= w || py < 0 || py >= h {
          break;
        }
        if mask[index(px, py)] {
          gap = 0;
          *end = (px, py);
        } else {
          gap += 1;
          if gap > max_gap {
            break;
          }
        }
        walker.step();
      }
    }

    let good_line =
      (ends[1].0 - ends[0].0).abs() >= min_length || (ends[1].1 - ends[0].1).abs() >= min_length;

    for (k, end) in ends.iter().enumerate() {
      let mut walker = if k == 0 { origin } else { origin.reversed() };
      loop {
        let (px, py) = walker.pixel();
        if px < 0 || px >= w || py < 0 || py >= h {
          break;
        }
        if mask[index(px, py)] {
          if good_line {
            accumulator.unvote(px, py);
          }
          mask[index(px, py)] = false;
        }
        if (px, py) == *end {
          break;
        }
        walker.step();
      }
    }

    if good_line {
      segments.push(LineSegment::new(
        Point::new(ends[0].0 as i32, ends[0].1 as i32),
        Point::new(ends[1].0 as i32, ends[1].1 as i32),
      ));
    }
  }

  segments
}

/// 将检测到的线段以给定线宽描回边缘图，再整体膨胀一次，
/// 使相邻线段连成连续的屏障
pub fn reconstruct_barrier(
  mut edges: GrayImage,
  params: &HoughParams,
  thickness: u32,
) -> (GrayImage, Vec<LineSegment>) {
  let segments = detect_segments(&edges, params);
  debug!("检测到 {} 条线段", segments.len());

  for segment in segments.iter() {
    draw_thick_line_mut(
      &mut edges,
      (segment.start.x, segment.start.y),
      (segment.end.x, segment.end.y),
      thickness,
      Luma([LINE_VALUE]),
    );
  }

  (dilate(&edges, &line_dilate_element()), segments)
}
