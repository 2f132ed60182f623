// 该文件是 Daolu （道路） 项目的一部分。
// src/lane/stroke.rs - 带线宽的线段与折线绘制
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

use imageproc::drawing::{
  BresenhamLineIter, Canvas, draw_filled_circle_mut, draw_line_segment_mut,
};
use imageproc::point::Point;

/// 绘制线段；线宽大于 1 时沿线段逐点盖圆形笔刷，端点为圆头
pub fn draw_thick_line_mut<C>(
  canvas: &mut C,
  start: (i32, i32),
  end: (i32, i32),
  thickness: u32,
  color: C::Pixel,
) where
  C: Canvas,
  C::Pixel: 'static,
{
  if thickness <= 1 {
    draw_line_segment_mut(
      canvas,
      (start.0 as f32, start.1 as f32),
      (end.0 as f32, end.1 as f32),
      color,
    );
    return;
  }

  let radius = (thickness / 2) as i32;
  let line = BresenhamLineIter::new(
    (start.0 as f32, start.1 as f32),
    (end.0 as f32, end.1 as f32),
  );
  for center in line {
    draw_filled_circle_mut(canvas, center, radius, color);
  }
}

/// 绘制首尾相连的折线
pub fn draw_closed_polyline_mut<C>(
  canvas: &mut C,
  points: &[Point<i32>],
  thickness: u32,
  color: C::Pixel,
) where
  C: Canvas,
  C::Pixel: 'static,
{
  match points {
    [] => {}
    [only] => draw_thick_line_mut(canvas, (only.x, only.y), (only.x, only.y), thickness, color),
    _ => {
      for (i, from) in points.iter().enumerate() {
        let to = points[(i + 1) % points.len()];
        draw_thick_line_mut(canvas, (from.x, from.y), (to.x, to.y), thickness, color);
      }
    }
  }
}
