//! Label map: short class codes to canonical class names
//!
//! Text format is one `<code> => <name>` mapping per line. Blank lines and
//! lines without `=>` are ignored.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SignPoseError};

/// Built-in map used when no map file is configured
pub const DEFAULT_MAP: &str = "\
A1 => nha_lau\n\
A2 => nha_may_ngoi\n\
A3 => nha_rong\n\
A4 => nha_san\n\
A5 => nha_biet_thu\n\
A6 => nha_tren_cay\n\
A7 => nha_go\n\
A8 => nha_chung_cu\n\
A9 => nha_tret\n\
A10 => nha_ky_tuc_xa\n\
A11 => tivi\n\
A12 => den\n\
A13 => dong_ho\n\
A14 => cau_thang\n\
A15 => chia_khoa\n\
A16 => o_khoa\n\
A17 => ban_ghe_sofa\n\
A18 => ban_tho\n\
A19 => dien_thoai_ban\n\
A20 => tranh_anh_treo_tuong\n\
A21 => ke_sach\n\
A22 => cai_chao\n\
A23 => cai_am\n\
A24 => con_dao\n\
A25 => may_say_sinh_to\n\
A26 => TU_LANH\n\
A27 => NOI\n\
A28 => BEP_GA\n\
A29 => MUONG\n\
A30 => DOI_DUA\n\
A31 => BAT\n\
A32 => GIUONG\n\
A33 => QUAT\n\
A34 => MAY_TINH\n\
A35 => BAN_LA\n\
A36 => REM\n\
A37 => thuoc_ke\n\
A38 => cai_keo\n\
A39 => com_pa\n\
A40 => cuc_tay\n\
A41 => ho_dan\n\
A42 => but_chi\n\
A43 => but_bi\n\
A44 => bang_phan\n\
A45 => vien_phan\n\
A46 => got_but_chi\n\
A47 => sua_chua\n\
A48 => ca_phe\n\
A49 => nuoc_uong\n\
A50 => banh_mi\n\
A51 => bun\n\
A52 => mi_quang\n\
A53 => xoi\n\
A54 => pho\n\
A55 => chao\n\
A56 => trung_op_la\n\
A57 => nang\n\
A58 => mat troi\n\
A59 => may\n\
A60 => gio\n\
A61 => nong\n\
A62 => mat\n\
A63 => lanh\n\
A64 => nhiet_do\n\
A65 => tuyet\n\
A66 => suong_mu\n\
A67 => tho_xay\n\
A68 => tho_lam_mong\n\
A69 => cat_toc\n\
A70 => sua_xe\n\
A71 => tho_son\n\
A72 => duong_bo\n\
A73 => duong_sat\n\
A74 => duong_thuy\n\
A75 => duong_hang_khong\n\
A76 => cap_treo\n\
A77 => may_bay\n\
A78 => cano_cao_toc\n\
A79 => xe_may\n\
A80 => xe_dap\n\
A81 => xe_buyt\n\
A82 => thuyen_buom\n\
A83 => xe_canh_sat\n\
A84 => xe_moto\n\
A85 => tau_hoa\n\
A86 => xe_tai\n\
A87 => xe_hoi\n\
A88 => xich_lo\n\
A89 => khinh_khi_cau\n\
A90 => xe_cuu_hoa\n\
A91 => tau_dien_ngam\n\
A92 => con_cho\n\
A93 => con_meo\n\
A94 => con_ca\n\
A95 => con_chuot\n\
A96 => con_rua\n\
A97 => con_chim\n\
A98 => con_bo\n\
A99 => con_ga\n\
A100 => con_ngua\n\
A101 => con_heo\n\
A102 => con_lua\n\
A103 => con_de\n\
A104 => con_trau\n\
A105 => con_ong\n\
A106 => con_tom\n\
A107 => boi\n\
A108 => cau_truot\n\
A109 => chay\n\
A110 => tha_dieu\n\
A111 => nhay_day\n\
A112 => da_cau\n\
A113 => da_bong\n\
A114 => cau_ca\n\
A115 => cam_trai\n\
A116 => keo_co\n\
A117 => con_lua\n\
A118 => may_anh\n\
A119 => mu_luoi_trai\n\
A120 => ong_nhom";

/// Mapping from short class codes (e.g. `A1`) to canonical class names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    entries: HashMap<String, String>,
}

impl LabelMap {
    /// Parse label map text. Later duplicates of a code overwrite earlier ones.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| line.split_once("=>"))
            .map(|(code, name)| (code.trim(), name.trim()))
            .filter(|(code, name)| !code.is_empty() && !name.is_empty())
            .map(|(code, name)| (code.to_string(), name.to_string()))
            .collect();
        Self { entries }
    }

    /// Read and parse a label map file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SignPoseError::io(path, e))?;
        Ok(Self::parse(&text))
    }

    /// Resolve a class code to its canonical name
    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::parse(DEFAULT_MAP)
    }
}
