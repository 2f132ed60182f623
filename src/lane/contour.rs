// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/contour.rs - 轮廓提取、最大轮廓选择与坐标还原
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

use image::{GrayImage, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::point::Point;

use crate::lane::stroke::draw_closed_polyline_mut;

/// 车道边界颜色（绿色）
pub const LANE_COLOR: [u8; 3] = [0, 255, 0];
/// 车道边界线宽
pub const LANE_THICKNESS: u32 = 2;

/// 轮廓点压缩方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChainApproximation {
  /// 保留全部边界像素
  None,
  /// 水平、竖直、对角方向上的连续段只保留端点
  #[default]
  Simple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneContour {
  pub points: Vec<Point<i32>>,
  /// 外层轮廓序号，车道选择时不使用
  pub parent: Option<usize>,
}

impl LaneContour {
  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// 按比例还原到原始分辨率
  pub fn rescaled(&self, scale: (f64, f64)) -> LaneContour {
    LaneContour {
      points: rescale(&self.points, scale),
      parent: self.parent,
    }
  }
}

fn step(from: Point<i32>, to: Point<i32>) -> (i32, i32) {
  ((to.x - from.x).signum(), (to.y - from.y).signum())
}

/// 去掉与前后点同方向的中间点
pub fn compress_chain(points: &[Point<i32>]) -> Vec<Point<i32>> {
  let n = points.len();
  if n < 3 {
    return points.to_vec();
  }

  points
    .iter()
    .enumerate()
    .filter(|&(i, &point)| {
      let prev = points[(i + n - 1) % n];
      let next = points[(i + 1) % n];
      step(prev, point) != step(point, next)
    })
    .map(|(_, &point)| point)
    .collect()
}

fn on_frame_border(point: &Point<i32>, width: u32, height: u32) -> bool {
  point.x <= 0 || point.y <= 0 || point.x >= width as i32 - 1 || point.y >= height as i32 - 1
}

/// 在二值掩码上提取轮廓
///
/// 完全落在画面外框上的轮廓只是画面本身的边界，不含车道信息，予以丢弃；
/// 其余轮廓的父序号随之重新编号。
pub fn find_lane_contours(mask: &GrayImage, approximation: ChainApproximation) -> Vec<LaneContour> {
  let (width, height) = mask.dimensions();
  let traced = find_contours::<i32>(mask);

  let mut remap = vec![None; traced.len()];
  let mut kept = Vec::with_capacity(traced.len());
  for (i, contour) in traced.iter().enumerate() {
    if contour
      .points
      .iter()
      .all(|p| on_frame_border(p, width, height))
    {
      continue;
    }
    remap[i] = Some(kept.len());
    kept.push(i);
  }

  kept
    .into_iter()
    .map(|i| {
      let contour = &traced[i];
      let points = match approximation {
        ChainApproximation::None => contour.points.clone(),
        ChainApproximation::Simple => compress_chain(&contour.points),
      };
      LaneContour {
        points,
        parent: contour.parent.and_then(|p| remap[p]),
      }
    })
    .collect()
}

/// 选取点数最多的轮廓；点数相同时取先出现的
///
/// 点数只是轮廓“细致程度”的近似，细长但面积很小的轮廓也可能被选中。
pub fn select_largest(contours: &[LaneContour]) -> Option<usize> {
  let mut best: Option<(usize, usize)> = None;
  for (i, contour) in contours.iter().enumerate() {
    match best {
      Some((_, len)) if contour.len() <= len => {}
      _ => best = Some((i, contour.len())),
    }
  }
  best.map(|(i, _)| i)
}

/// 坐标按 `(sx, sy)` 缩放并取最近整数
pub fn rescale(points: &[Point<i32>], scale: (f64, f64)) -> Vec<Point<i32>> {
  points
    .iter()
    .map(|p| {
      Point::new(
        (p.x as f64 * scale.0).round() as i32,
        (p.y as f64 * scale.1).round() as i32,
      )
    })
    .collect()
}

/// 在彩色帧上绘制闭合轮廓
pub fn draw_contour_mut(image: &mut RgbImage, contour: &LaneContour) {
  draw_closed_polyline_mut(image, &contour.points, LANE_THICKNESS, Rgb(LANE_COLOR));
}
