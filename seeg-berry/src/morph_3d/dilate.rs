//! 6-邻域 (钻石型) 二值膨胀.

use ndarray::Array3;

use crate::Idx3d;

/// 获取 `pos` 前后上下左右六个点的坐标.
///
/// 在 `shape` 范围外的坐标会被过滤掉, 不会包含在返回值中.
fn diamond_neighbours((dx, dy, dz): Idx3d, (x, y, z): Idx3d) -> impl Iterator<Item = Idx3d> {
    [
        (x.wrapping_sub(1), y, z),
        (x.saturating_add(1), y, z),
        (x, y.wrapping_sub(1), z),
        (x, y.saturating_add(1), z),
        (x, y, z.wrapping_sub(1)),
        (x, y, z.saturating_add(1)),
    ]
    .into_iter()
    .filter(move |&(a, b, c)| a < dx && b < dy && c < dz)
}

/// 在边长 `2 * radius + 1` 的立方体中心放置种子, 并做 `radius` 次 6-邻域膨胀.
pub(super) fn dilate_seed(radius: usize) -> Array3<bool> {
    let side = 2 * radius + 1;
    let shape = (side, side, side);
    let mut grid = Array3::from_elem(shape, false);

    let seed = (radius, radius, radius);
    grid[seed] = true;

    // 每轮只有上一轮新加入的体素 (波前) 能贡献新的邻居.
    let mut front = vec![seed];
    for _ in 0..radius {
        let mut next = Vec::with_capacity(front.len() * 4);
        for pos in front {
            for neigh in diamond_neighbours(shape, pos) {
                if !grid[neigh] {
                    grid[neigh] = true;
                    next.push(neigh);
                }
            }
        }
        front = next;
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::{diamond_neighbours, dilate_seed};

    #[test]
    fn test_diamond_neighbours_filtered() {
        let corner: Vec<_> = diamond_neighbours((3, 3, 3), (0, 0, 0)).collect();
        assert_eq!(corner, vec![(1, 0, 0), (0, 1, 0), (0, 0, 1)]);
        assert_eq!(diamond_neighbours((3, 3, 3), (1, 1, 1)).count(), 6);
    }

    #[test]
    fn test_dilate_zero_radius() {
        let g = dilate_seed(0);
        assert_eq!(g.dim(), (1, 1, 1));
        assert!(g[(0, 0, 0)]);
    }

    #[test]
    fn test_dilate_one_is_cross() {
        let g = dilate_seed(1);
        assert_eq!(g.iter().filter(|v| **v).count(), 7);
        assert!(g[(1, 1, 0)] && g[(0, 1, 1)] && g[(1, 2, 1)]);
        assert!(!g[(0, 0, 1)]);
    }
}
